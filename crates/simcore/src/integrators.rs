use crate::{ArmState, JointAccelerations, SimContext};

/// A generic integration strategy trait.
pub trait Integrator {
    /// Advances `state` by one timestep under constant joint accelerations.
    fn integrate(&self, ctx: &SimContext, state: ArmState, accel: JointAccelerations) -> ArmState;
}

/// Semi-implicit (symplectic) Euler integrator.
/// Velocity is updated first and the NEW velocity moves the angle.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemiImplicitEuler;

impl Integrator for SemiImplicitEuler {
    fn integrate(&self, ctx: &SimContext, state: ArmState, accel: JointAccelerations) -> ArmState {
        let dt = ctx.dt;
        let omega1 = state.omega1 + accel.alpha1 * dt;
        let omega2 = state.omega2 + accel.alpha2 * dt;

        ArmState {
            theta1: state.theta1 + omega1 * dt,
            theta2: state.theta2 + omega2 * dt,
            omega1,
            omega2,
        }
    }
}
