//! Torque laws for the acrobot
//!
//! Every law is a pure function of the plant and the current state and returns
//! the raw elbow torque. Saturation is left to the supervisor.

use std::f64::consts::{PI, TAU};

use nalgebra::Vector4;
use simcore::AcrobotState;

use mechanics::Acrobot;

use crate::error::{ControlError, ControlResult};
use crate::lqr::{CostWeights, LqrGain, solve_lqr};

/// Wrap an angle into (−π, π].
pub fn wrap_angle(angle: f64) -> f64 {
    PI - (PI - angle).rem_euclid(TAU)
}

/// Deviation of `state` from `target` with both angle errors wrapped.
pub fn state_error(state: &AcrobotState, target: &AcrobotState) -> Vector4<f64> {
    Vector4::new(
        wrap_angle(state.theta1 - target.theta1),
        wrap_angle(state.theta2 - target.theta2),
        state.omega1 - target.omega1,
        state.omega2 - target.omega2,
    )
}

/// A state-feedback torque law.
pub trait TorqueLaw {
    fn torque(&self, plant: &Acrobot, state: &AcrobotState) -> f64;
}

/// Energy pumping toward a target energy level.
///
/// `u = −k·ω2·(E − E*)` with `E` the total mechanical energy. Torque along the
/// elbow velocity changes the energy at rate `u·ω2`, so this drives `E → E*`
/// without regard to phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergySwingUp {
    pub gain: f64,
    pub desired_energy: f64,
}

impl EnergySwingUp {
    pub fn new(gain: f64, desired_energy: f64) -> ControlResult<Self> {
        if !gain.is_finite() || gain < 0.0 {
            return Err(ControlError::InvalidSetting {
                name: "swing_up.gain",
                value: gain,
            });
        }
        if !desired_energy.is_finite() {
            return Err(ControlError::InvalidSetting {
                name: "swing_up.desired_energy",
                value: desired_energy,
            });
        }
        Ok(EnergySwingUp {
            gain,
            desired_energy,
        })
    }

    /// Target the energy of `equilibrium` itself.
    pub fn toward(plant: &Acrobot, equilibrium: &AcrobotState, gain: f64) -> ControlResult<Self> {
        Self::new(gain, plant.total_energy(equilibrium))
    }
}

impl TorqueLaw for EnergySwingUp {
    fn torque(&self, plant: &Acrobot, state: &AcrobotState) -> f64 {
        let energy_error = plant.total_energy(state) - self.desired_energy;
        -self.gain * state.omega2 * energy_error
    }
}

/// PD stabilizer with gravity compensation at the elbow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdStabilizer {
    /// Gains on the wrapped angle errors (θ1, θ2)
    pub kp: [f64; 2],
    /// Gains on the velocity errors (ω1, ω2)
    pub kd: [f64; 2],
    pub target: AcrobotState,
}

impl Default for PdStabilizer {
    fn default() -> Self {
        PdStabilizer {
            kp: [-230.0, -80.0],
            kd: [-100.0, -40.0],
            target: AcrobotState::upright(),
        }
    }
}

impl PdStabilizer {
    pub fn new(kp: [f64; 2], kd: [f64; 2], target: AcrobotState) -> ControlResult<Self> {
        let names = ["pd.kp[0]", "pd.kp[1]", "pd.kd[0]", "pd.kd[1]"];
        for (name, value) in names.into_iter().zip(kp.into_iter().chain(kd)) {
            if !value.is_finite() {
                return Err(ControlError::InvalidSetting { name, value });
            }
        }
        Ok(PdStabilizer { kp, kd, target })
    }
}

impl TorqueLaw for PdStabilizer {
    fn torque(&self, plant: &Acrobot, state: &AcrobotState) -> f64 {
        let e = state_error(state, &self.target);
        let compensation = plant.gravity(state)[1];
        compensation
            - self.kp[0] * e[0]
            - self.kp[1] * e[1]
            - self.kd[0] * e[2]
            - self.kd[1] * e[3]
    }
}

/// Linear-quadratic regulator about a fixed equilibrium.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LqrStabilizer {
    pub gain: LqrGain,
    pub equilibrium: AcrobotState,
}

impl LqrStabilizer {
    /// Linearize the plant about `equilibrium` and synthesize the gain.
    pub fn design(
        plant: &Acrobot,
        equilibrium: &AcrobotState,
        weights: &CostWeights,
    ) -> ControlResult<Self> {
        let system = plant.linearize(equilibrium)?;
        let gain = solve_lqr(&system, weights)?;
        Ok(LqrStabilizer {
            gain,
            equilibrium: *equilibrium,
        })
    }
}

impl TorqueLaw for LqrStabilizer {
    fn torque(&self, _plant: &Acrobot, state: &AcrobotState) -> f64 {
        self.gain.feedback(&state_error(state, &self.equilibrium))
    }
}

/// The local law used once the state is near the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stabilizer {
    Pd(PdStabilizer),
    Lqr(LqrStabilizer),
}

impl Stabilizer {
    pub fn target(&self) -> &AcrobotState {
        match self {
            Stabilizer::Pd(pd) => &pd.target,
            Stabilizer::Lqr(lqr) => &lqr.equilibrium,
        }
    }
}

impl TorqueLaw for Stabilizer {
    fn torque(&self, plant: &Acrobot, state: &AcrobotState) -> f64 {
        match self {
            Stabilizer::Pd(pd) => pd.torque(plant, state),
            Stabilizer::Lqr(lqr) => lqr.torque(plant, state),
        }
    }
}
