//! Acrobot simulation runs
//!
//! This crate provides:
//! - Simulation configuration with JSON loading and scenario presets
//! - A fixed-step driver with streaming sinks and cooperative cancellation
//! - Parallel batches over perturbed initial states

pub mod batch;
pub mod config;
pub mod driver;
pub mod error;

pub use batch::{BatchOutcome, BatchSummary, perturbed_states, run_batch};
pub use config::SimulationConfig;
pub use driver::{RunStatus, Sample, Simulation, Trajectory, TrajectorySink, run, run_with_sink};
pub use error::{ConfigError, SimulationError, SimulationFailure};
