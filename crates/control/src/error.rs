//! Error types for controller synthesis and configuration.

use mechanics::DynamicsError;
use thiserror::Error;

/// Errors detected while designing or configuring a controller.
///
/// All of these are configuration errors: they surface before a simulation
/// step runs and are never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlError {
    /// Q is not positive semi-definite or R is not positive.
    #[error("Invalid cost weights: {0}")]
    InvalidCostWeights(String),

    /// The linearized pair (A, B) cannot be steered by the input.
    #[error("Linearized system is not controllable")]
    UncontrollableSystem,

    /// The Riccati iteration failed to produce a solution.
    #[error("Riccati solver did not converge after {iterations} iterations")]
    RiccatiDidNotConverge { iterations: usize },

    /// The Riccati solution does not satisfy the equation to working precision.
    #[error("Riccati residual too large: {residual}")]
    RiccatiResidual { residual: f64 },

    /// The resulting gain leaves an eigenvalue in the closed right half-plane.
    #[error("Closed loop is not stable (max real part {max_real_part})")]
    NotStabilizing { max_real_part: f64 },

    /// A controller gain or threshold is out of range.
    #[error("Invalid controller setting {name}: {value}")]
    InvalidSetting { name: &'static str, value: f64 },

    #[error(transparent)]
    Dynamics(#[from] DynamicsError),
}

/// Result type for controller synthesis.
pub type ControlResult<T> = std::result::Result<T, ControlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ControlError::RiccatiDidNotConverge { iterations: 100 };
        assert_eq!(format!("{err}"), "Riccati solver did not converge after 100 iterations");

        let err: ControlError = DynamicsError::NotAnEquilibrium { residual: 0.5 }.into();
        assert!(format!("{err}").contains("not an equilibrium"));
    }
}
