//! Serializable controller selection
//!
//! Controllers are described declaratively and built against a concrete
//! plant. Linearization and LQR synthesis happen inside `build`, so every
//! configuration error surfaces before the simulation starts.

use log::info;
use serde::{Deserialize, Serialize};
use simcore::{AcrobotState, ControlModel};

use mechanics::{Acrobot, AcrobotParams};

use crate::error::ControlResult;
use crate::laws::{EnergySwingUp, LqrStabilizer, PdStabilizer, Stabilizer};
use crate::lqr::CostWeights;
use crate::supervisor::{AcrobotController, OpenLoop, SwitchPolicy};

/// Energy pumping settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwingUpConfig {
    /// Gain `k` of `u = −k·ω2·(E − E*)`
    pub gain: f64,
    /// Target energy; defaults to the energy of the equilibrium
    pub desired_energy: Option<f64>,
}

impl Default for SwingUpConfig {
    fn default() -> Self {
        SwingUpConfig {
            gain: 1.0,
            desired_energy: None,
        }
    }
}

impl SwingUpConfig {
    pub fn with_gain(mut self, gain: f64) -> Self {
        self.gain = gain;
        self
    }

    pub fn with_desired_energy(mut self, desired_energy: f64) -> Self {
        self.desired_energy = Some(desired_energy);
        self
    }

    fn build(&self, plant: &Acrobot, equilibrium: &AcrobotState) -> ControlResult<EnergySwingUp> {
        match self.desired_energy {
            Some(energy) => EnergySwingUp::new(self.gain, energy),
            None => EnergySwingUp::toward(plant, equilibrium, self.gain),
        }
    }
}

/// PD gains on (θ1, θ2) and (ω1, ω2).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdConfig {
    pub kp: [f64; 2],
    pub kd: [f64; 2],
}

impl Default for PdConfig {
    fn default() -> Self {
        let pd = PdStabilizer::default();
        PdConfig {
            kp: pd.kp,
            kd: pd.kd,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LqrConfig {
    pub weights: CostWeights,
}

/// Local stabilizing law.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StabilizerConfig {
    Pd(PdConfig),
    Lqr(LqrConfig),
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        StabilizerConfig::Lqr(LqrConfig::default())
    }
}

impl StabilizerConfig {
    pub fn build(&self, plant: &Acrobot, equilibrium: &AcrobotState) -> ControlResult<Stabilizer> {
        Ok(match self {
            StabilizerConfig::Pd(pd) => {
                Stabilizer::Pd(PdStabilizer::new(pd.kp, pd.kd, *equilibrium)?)
            }
            StabilizerConfig::Lqr(lqr) => {
                let law = LqrStabilizer::design(plant, equilibrium, &lqr.weights)?;
                info!("Synthesized LQR gain K = {}", law.gain.k);
                Stabilizer::Lqr(law)
            }
        })
    }
}

/// Which controller drives the elbow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControllerConfig {
    /// Zero torque
    Passive,
    /// Energy pumping without a local stabilizer
    SwingUp(SwingUpConfig),
    Pd(PdConfig),
    Lqr(LqrConfig),
    SwingUpThenStabilize {
        #[serde(default)]
        swing_up: SwingUpConfig,
        #[serde(default)]
        stabilizer: StabilizerConfig,
        #[serde(default)]
        switch: SwitchPolicy,
    },
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig::SwingUpThenStabilize {
            swing_up: SwingUpConfig::default(),
            stabilizer: StabilizerConfig::default(),
            switch: SwitchPolicy::default(),
        }
    }
}

impl ControllerConfig {
    /// Instantiate the controller for `params` about `equilibrium`.
    pub fn build(
        &self,
        params: &AcrobotParams,
        equilibrium: &AcrobotState,
    ) -> ControlResult<Box<dyn ControlModel + Send>> {
        let plant = Acrobot::new(*params)?;
        let controller: Box<dyn ControlModel + Send> = match self {
            ControllerConfig::Passive => Box::new(OpenLoop::passive()),
            ControllerConfig::SwingUp(swing_up) => Box::new(AcrobotController::swing_up_only(
                plant,
                swing_up.build(&plant, equilibrium)?,
            )),
            ControllerConfig::Pd(pd) => Box::new(AcrobotController::stabilizing(
                plant,
                StabilizerConfig::Pd(*pd).build(&plant, equilibrium)?,
            )),
            ControllerConfig::Lqr(lqr) => Box::new(AcrobotController::stabilizing(
                plant,
                StabilizerConfig::Lqr(*lqr).build(&plant, equilibrium)?,
            )),
            ControllerConfig::SwingUpThenStabilize {
                swing_up,
                stabilizer,
                switch,
            } => Box::new(AcrobotController::swing_up_then_stabilize(
                plant,
                swing_up.build(&plant, equilibrium)?,
                stabilizer.build(&plant, equilibrium)?,
                *switch,
            )?),
        };
        Ok(controller)
    }
}
