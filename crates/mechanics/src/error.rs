//! Error types for the acrobot model.

use thiserror::Error;

/// Errors raised while validating parameters or evaluating the dynamics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DynamicsError {
    /// A physical constant is out of range.
    #[error("Invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    /// The mass matrix is not positive definite for some elbow angle.
    #[error("Mass matrix is not positive definite (determinant {determinant} at cos(theta2) = {cos_theta2})")]
    IndefiniteMassMatrix { cos_theta2: f64, determinant: f64 },

    /// The mass matrix could not be inverted at the current configuration.
    #[error("Singular mass matrix at theta2 = {theta2} (determinant {determinant})")]
    SingularMassMatrix { theta2: f64, determinant: f64 },

    /// The linearization target does not satisfy the equilibrium conditions.
    #[error("Target state is not an equilibrium (residual {residual})")]
    NotAnEquilibrium { residual: f64 },
}

/// Result type for model operations.
pub type DynamicsResult<T> = std::result::Result<T, DynamicsError>;
