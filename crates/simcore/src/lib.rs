//! Shared state types, traits and integrators for the two-link arm simulation.

pub mod integrators;
pub mod traits;

pub use integrators::{Integrator, SemiImplicitEuler};
pub use traits::*;
