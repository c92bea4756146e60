//! Error types for configuration loading and simulation runs.

use std::path::PathBuf;

use control::ControlError;
use mechanics::DynamicsError;
use simcore::AcrobotState;
use thiserror::Error;

use crate::driver::Trajectory;

/// Problems with a simulation configuration, all detected before the first step.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid setting {name}: {value}")]
    InvalidValue { name: &'static str, value: f64 },

    #[error("Invalid acrobot parameters: {0}")]
    Parameters(#[from] DynamicsError),

    #[error("Controller setup failed: {0}")]
    Controller(#[from] ControlError),
}

/// Fatal conditions hit while stepping a simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("Time step must be finite and positive, got {dt}")]
    InvalidTimeStep { dt: f64 },

    /// A torque or state became NaN or infinite.
    #[error("Numerical divergence at step {step}")]
    NumericalDivergence {
        step: usize,
        /// Last state that was still finite
        last_state: AcrobotState,
    },

    #[error("Dynamics evaluation failed at step {step}: {source}")]
    Dynamics {
        step: usize,
        #[source]
        source: DynamicsError,
    },
}

/// A failed run: the error plus every sample recorded before it.
#[derive(Debug, Error)]
#[error("Simulation aborted after {} samples: {error}", .trajectory.len())]
pub struct SimulationFailure {
    #[source]
    pub error: SimulationError,
    pub trajectory: Trajectory,
}
