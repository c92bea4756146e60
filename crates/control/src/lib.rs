//! Controllers for the acrobot
//!
//! This crate provides:
//! - LQR synthesis through the continuous-time algebraic Riccati equation
//! - Energy-based swing-up, PD and LQR torque laws
//! - A supervisor switching between swing-up and stabilization with saturation
//! - Serializable controller configurations

pub mod config;
pub mod error;
pub mod laws;
pub mod lqr;
pub mod supervisor;

pub use config::*;
pub use error::{ControlError, ControlResult};
pub use laws::*;
pub use lqr::*;
pub use supervisor::*;
