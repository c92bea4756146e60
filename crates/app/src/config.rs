//! Simulation configuration
//!
//! Everything a run needs is fixed up front: plant constants, initial and
//! target states, the controller, the integrator and the time grid. Missing
//! JSON fields fall back to the swing-up scenario defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use simcore::{AcrobotState, IntegrationScheme};

use control::{ControllerConfig, CostWeights, LqrConfig};
use mechanics::AcrobotParams;

use crate::error::ConfigError;

/// Complete description of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Physical constants and actuator limit
    pub params: AcrobotParams,
    pub initial_state: AcrobotState,
    /// Equilibrium the controller drives toward
    pub equilibrium: AcrobotState,
    pub controller: ControllerConfig,
    pub integrator: IntegrationScheme,
    /// Control period and integration step (s)
    pub dt: f64,
    /// Simulated time (s)
    pub duration: f64,
    /// Integrator sub-steps per control period
    pub substeps: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::swing_up_scenario()
    }
}

impl SimulationConfig {
    /// Swing up from a small offset of the hanging position and balance with LQR.
    pub fn swing_up_scenario() -> Self {
        SimulationConfig {
            params: AcrobotParams::default(),
            initial_state: AcrobotState::new(std::f64::consts::PI / 16.0, 0.0, 0.0, 0.0),
            equilibrium: AcrobotState::upright(),
            controller: ControllerConfig::default(),
            integrator: IntegrationScheme::Rk4,
            dt: 0.01,
            duration: 20.0,
            substeps: 1,
        }
    }

    /// Catch a small upright offset with LQR only.
    pub fn lqr_balance_scenario() -> Self {
        SimulationConfig {
            initial_state: AcrobotState::new(std::f64::consts::PI + 0.01, 0.0, 0.0, 0.0),
            controller: ControllerConfig::Lqr(LqrConfig {
                weights: CostWeights::default(),
            }),
            duration: 10.0,
            ..Self::swing_up_scenario()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_params(mut self, params: AcrobotParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_initial_state(mut self, initial_state: AcrobotState) -> Self {
        self.initial_state = initial_state;
        self
    }

    pub fn with_controller(mut self, controller: ControllerConfig) -> Self {
        self.controller = controller;
        self
    }

    pub fn with_integrator(mut self, integrator: IntegrationScheme) -> Self {
        self.integrator = integrator;
        self
    }

    pub fn with_timing(mut self, dt: f64, duration: f64) -> Self {
        self.dt = dt;
        self.duration = duration;
        self
    }

    pub fn with_substeps(mut self, substeps: u32) -> Self {
        self.substeps = substeps;
        self
    }

    /// Number of control steps covering `duration`.
    pub fn num_steps(&self) -> usize {
        (self.duration / self.dt).round() as usize
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "dt",
                value: self.dt,
            });
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "duration",
                value: self.duration,
            });
        }
        if self.substeps == 0 {
            return Err(ConfigError::InvalidValue {
                name: "substeps",
                value: 0.0,
            });
        }
        if !self.initial_state.is_finite() {
            return Err(ConfigError::InvalidValue {
                name: "initial_state",
                value: f64::NAN,
            });
        }
        if !self.equilibrium.is_finite() {
            return Err(ConfigError::InvalidValue {
                name: "equilibrium",
                value: f64::NAN,
            });
        }
        self.params.validate()?;
        Ok(())
    }
}
