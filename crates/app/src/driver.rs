//! Simulation Driver
//!
//! Owns the arm state and steps it with torques from an oracle until the arm
//! rests at the target or the step budget runs out.
//!
//! Each step records the angles at the start of the previous step, the
//! angles at the start of this step, the angles after integrating and the
//! torques applied. The "previous" angles therefore lag by one whole step.

use log::debug;
use mechanics::TwoLinkArm;
use serde::{Deserialize, Serialize};
use simcore::{ArmState, QueryVector, SimContext, TorqueOracle, Transition};

/// Configuration for the driver loop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Step budget
    pub max_steps: usize,
    /// Absolute tolerance on each angle (rad) and each velocity (rad/s)
    pub tolerance: f64,
    /// Target angles (rad)
    pub target: (f64, f64),
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_steps: 1000,
            tolerance: 0.01,
            target: (0.0, 0.0),
        }
    }
}

impl DriverConfig {
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

/// Where a run currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Running,
    /// Both angles at the target and both velocities near zero
    Converged,
    /// Step budget used up without converging
    Exhausted,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        self != Phase::Running
    }
}

/// Result of a finished run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationOutcome {
    pub termination: Phase,
    pub final_state: ArmState,
    pub transitions: Vec<Transition>,
}

impl SimulationOutcome {
    pub fn steps(&self) -> usize {
        self.transitions.len()
    }
}

#[derive(Debug, Clone)]
pub struct Simulation {
    arm: TwoLinkArm,
    config: DriverConfig,
}

impl Simulation {
    pub fn new(arm: TwoLinkArm, config: DriverConfig) -> Self {
        Self { arm, config }
    }

    pub fn arm(&self) -> &TwoLinkArm {
        &self.arm
    }

    /// Four independent checks, not a combined norm.
    pub fn is_converged(&self, state: &ArmState) -> bool {
        let tol = self.config.tolerance;
        let (target1, target2) = self.config.target;
        (state.theta1 - target1).abs() < tol
            && state.omega1.abs() < tol
            && (state.theta2 - target2).abs() < tol
            && state.omega2.abs() < tol
    }

    /// Starts a run from rest at the given angles.
    pub fn start(&self, initial: (f64, f64)) -> Episode<'_> {
        let state = ArmState::at_rest(initial.0, initial.1);
        let phase = if self.config.max_steps == 0 {
            Phase::Exhausted
        } else {
            Phase::Running
        };
        Episode {
            sim: self,
            state,
            prev: state.angles(),
            ctx: SimContext::new(self.arm.config.dt),
            phase,
            transitions: Vec::new(),
        }
    }

    pub fn run<O: TorqueOracle + ?Sized>(
        &self,
        initial: (f64, f64),
        oracle: &mut O,
    ) -> SimulationOutcome {
        self.run_with(initial, oracle, |_| {})
    }

    /// Runs to a terminal phase, handing every new transition to `on_step`.
    pub fn run_with<O, F>(
        &self,
        initial: (f64, f64),
        oracle: &mut O,
        mut on_step: F,
    ) -> SimulationOutcome
    where
        O: TorqueOracle + ?Sized,
        F: FnMut(&Transition),
    {
        let mut episode = self.start(initial);
        while let Some(transition) = episode.step(oracle) {
            on_step(transition);
        }
        episode.finish()
    }
}

/// One run in progress.
#[derive(Debug, Clone)]
pub struct Episode<'a> {
    sim: &'a Simulation,
    state: ArmState,
    prev: (f64, f64),
    ctx: SimContext,
    phase: Phase,
    transitions: Vec<Transition>,
}

impl<'a> Episode<'a> {
    /// Performs one step. Returns `None` once the run is terminal.
    pub fn step<O: TorqueOracle + ?Sized>(&mut self, oracle: &mut O) -> Option<&Transition> {
        if self.phase.is_terminal() {
            return None;
        }

        let start = self.state;
        let query = QueryVector::new(self.prev, start.angles(), start.angles());
        let torques = oracle.resolve(&query, &start);

        self.state = self.sim.arm.step(start, torques);
        self.ctx.advance();

        let record = Transition::new(
            QueryVector::new(self.prev, start.angles(), self.state.angles()),
            torques,
        );
        self.transitions.push(record);
        self.prev = start.angles();

        debug!(
            "step {} t={:.2}s theta=({:.6}, {:.6}) omega=({:.6}, {:.6})",
            self.ctx.step,
            self.ctx.t,
            self.state.theta1,
            self.state.theta2,
            self.state.omega1,
            self.state.omega2
        );

        if self.sim.is_converged(&self.state) {
            self.phase = Phase::Converged;
        } else if self.transitions.len() >= self.sim.config.max_steps {
            self.phase = Phase::Exhausted;
        }

        self.transitions.last()
    }

    pub fn finish(self) -> SimulationOutcome {
        SimulationOutcome {
            termination: self.phase,
            final_state: self.state,
            transitions: self.transitions,
        }
    }
}
