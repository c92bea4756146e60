//! Shared simulation vocabulary: the acrobot state, model traits and
//! fixed-step integrators.

pub mod integrators;
pub mod traits;

pub use integrators::{ExplicitEuler, IntegrationScheme, Integrator, RungeKutta4, Substepped};
pub use traits::*;
