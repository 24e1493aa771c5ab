//! Two-Link Arm - Decoupled pendulum dynamics
//!
//! Provides:
//! - Physical constants of the two rods (lengths, masses, gravity, time step)
//! - Gravity-only joint torques, used as the fallback torque source
//! - One fixed-timestep state update
//! - Forward kinematics of the elbow and tip

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use simcore::{
    ArmState, Integrator, JointAccelerations, JointTorques, SemiImplicitEuler, SimContext,
};

/// Configuration for the two-link arm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmConfig {
    /// Gravitational acceleration (m/s²)
    pub gravity: f64,
    /// Length of the first rod (m)
    pub length1: f64,
    /// Length of the second rod (m)
    pub length2: f64,
    /// Mass of the first rod (kg)
    pub mass1: f64,
    /// Mass of the second rod (kg)
    pub mass2: f64,
    /// Integration time step (s)
    pub dt: f64,
}

impl Default for ArmConfig {
    fn default() -> Self {
        ArmConfig {
            gravity: 9.81,
            length1: 1.0,
            length2: 1.5,
            mass1: 1.0,
            mass2: 1.5,
            dt: 0.01,
        }
    }
}

impl ArmConfig {
    /// Moment of inertia of the first joint (m·L²)
    pub fn inertia1(&self) -> f64 {
        self.mass1 * self.length1 * self.length1
    }

    /// Moment of inertia of the second joint (m·L²)
    pub fn inertia2(&self) -> f64 {
        self.mass2 * self.length2 * self.length2
    }
}

/// Two rods on revolute joints, each joint treated as an independent
/// rotating body. No cross-coupling between the joints is modeled.
#[derive(Debug, Clone)]
pub struct TwoLinkArm<I: Integrator = SemiImplicitEuler> {
    pub config: ArmConfig,
    integrator: I,
}

impl TwoLinkArm<SemiImplicitEuler> {
    pub fn new(config: ArmConfig) -> Self {
        Self {
            config,
            integrator: SemiImplicitEuler,
        }
    }
}

impl Default for TwoLinkArm<SemiImplicitEuler> {
    fn default() -> Self {
        Self::new(ArmConfig::default())
    }
}

impl<I: Integrator> TwoLinkArm<I> {
    pub fn with_integrator(config: ArmConfig, integrator: I) -> Self {
        Self { config, integrator }
    }

    /// Gravity-only torque at each joint.
    ///
    /// Joint 1 carries both rod masses on the first rod's length; joint 2
    /// carries only the second rod. Both oppose the sign of their angle.
    pub fn gravitational_torques(&self, theta1: f64, theta2: f64) -> JointTorques {
        let c = &self.config;
        let tau1 = -c.mass1 * c.gravity * c.length1 * theta1.sin()
            - c.mass2 * c.gravity * c.length1 * theta1.sin();
        let tau2 = -c.mass2 * c.gravity * c.length2 * theta2.sin();
        JointTorques::new(tau1, tau2)
    }

    /// Angular acceleration of each joint (τ = Iα)
    pub fn accelerations(&self, torques: JointTorques) -> JointAccelerations {
        JointAccelerations {
            alpha1: torques.tau1 / self.config.inertia1(),
            alpha2: torques.tau2 / self.config.inertia2(),
        }
    }

    /// Advances the arm by one fixed time step under constant torques.
    pub fn step(&self, state: ArmState, torques: JointTorques) -> ArmState {
        let ctx = SimContext::new(self.config.dt);
        self.integrator
            .integrate(&ctx, state, self.accelerations(torques))
    }

    /// Elbow and tip positions relative to the base pivot (m).
    ///
    /// Angles are measured from the upward vertical; the second angle is
    /// relative to the first rod.
    pub fn joint_positions(&self, state: &ArmState) -> (Vector2<f64>, Vector2<f64>) {
        let c = &self.config;
        let elbow = Vector2::new(c.length1 * state.theta1.sin(), c.length1 * state.theta1.cos());
        let absolute2 = state.theta1 + state.theta2;
        let tip = elbow + Vector2::new(c.length2 * absolute2.sin(), c.length2 * absolute2.cos());
        (elbow, tip)
    }
}
