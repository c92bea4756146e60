//! Mode supervision for the acrobot controller
//!
//! The controller is a two-state machine:
//! - `SwingUp` pumps energy until the first link comes within the engage
//!   threshold of the target
//! - `Stabilize` hands over to the local law (PD or LQR)
//!
//! Falling back to `SwingUp` happens only when a release threshold is
//! configured; without one the switch is permanent.

use log::info;
use serde::{Deserialize, Serialize};
use simcore::{AcrobotState, ControlModel, Model, SimContext};

use mechanics::{Acrobot, AcrobotParams};

use crate::error::{ControlError, ControlResult};
use crate::laws::{EnergySwingUp, Stabilizer, TorqueLaw, wrap_angle};

/// Active control law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    #[default]
    SwingUp,
    Stabilize,
}

/// When to hand over between swing-up and stabilization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchPolicy {
    /// Engage the stabilizer once |wrap(θ1 − θ1*)| drops below this (rad)
    pub engage_threshold: f64,
    /// Return to swing-up once the distance exceeds this (rad); `None` never returns
    pub release_threshold: Option<f64>,
}

impl Default for SwitchPolicy {
    fn default() -> Self {
        SwitchPolicy {
            engage_threshold: 0.3,
            release_threshold: None,
        }
    }
}

impl SwitchPolicy {
    pub fn new(engage_threshold: f64) -> Self {
        SwitchPolicy {
            engage_threshold,
            release_threshold: None,
        }
    }

    /// Enable re-entry into swing-up with hysteresis.
    pub fn with_release(mut self, release_threshold: f64) -> Self {
        self.release_threshold = Some(release_threshold);
        self
    }

    /// Distance metric used for switching.
    pub fn distance(&self, state: &AcrobotState, target: &AcrobotState) -> f64 {
        wrap_angle(state.theta1 - target.theta1).abs()
    }

    pub fn next_mode(&self, mode: ControlMode, distance: f64) -> ControlMode {
        match mode {
            ControlMode::SwingUp if distance < self.engage_threshold => ControlMode::Stabilize,
            ControlMode::Stabilize => match self.release_threshold {
                Some(release) if distance > release => ControlMode::SwingUp,
                _ => ControlMode::Stabilize,
            },
            mode => mode,
        }
    }

    pub fn validate(&self) -> ControlResult<()> {
        if !self.engage_threshold.is_finite() || self.engage_threshold <= 0.0 {
            return Err(ControlError::InvalidSetting {
                name: "switch.engage_threshold",
                value: self.engage_threshold,
            });
        }
        if let Some(release) = self.release_threshold {
            if !release.is_finite() || release < self.engage_threshold {
                return Err(ControlError::InvalidSetting {
                    name: "switch.release_threshold",
                    value: release,
                });
            }
        }
        Ok(())
    }
}

/// A recorded mode change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeTransition {
    pub t: f64,
    pub from: ControlMode,
    pub to: ControlMode,
}

/// Swing-up / stabilization supervisor with actuator saturation.
#[derive(Debug, Clone)]
pub struct AcrobotController {
    plant: Acrobot,
    swing_up: Option<EnergySwingUp>,
    stabilizer: Option<Stabilizer>,
    policy: SwitchPolicy,
    initial_mode: ControlMode,
    mode: ControlMode,
    transitions: Vec<ModeTransition>,
}

impl AcrobotController {
    fn with_laws(
        plant: Acrobot,
        swing_up: Option<EnergySwingUp>,
        stabilizer: Option<Stabilizer>,
        policy: SwitchPolicy,
    ) -> Self {
        let initial_mode = if swing_up.is_some() {
            ControlMode::SwingUp
        } else {
            ControlMode::Stabilize
        };
        AcrobotController {
            plant,
            swing_up,
            stabilizer,
            policy,
            initial_mode,
            mode: initial_mode,
            transitions: Vec::new(),
        }
    }

    /// Energy pumping only, never switches.
    pub fn swing_up_only(plant: Acrobot, swing_up: EnergySwingUp) -> Self {
        Self::with_laws(plant, Some(swing_up), None, SwitchPolicy::default())
    }

    /// Local stabilization only.
    pub fn stabilizing(plant: Acrobot, stabilizer: Stabilizer) -> Self {
        Self::with_laws(plant, None, Some(stabilizer), SwitchPolicy::default())
    }

    /// Swing-up followed by stabilization once `policy` engages.
    pub fn swing_up_then_stabilize(
        plant: Acrobot,
        swing_up: EnergySwingUp,
        stabilizer: Stabilizer,
        policy: SwitchPolicy,
    ) -> ControlResult<Self> {
        policy.validate()?;
        Ok(Self::with_laws(plant, Some(swing_up), Some(stabilizer), policy))
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn transitions(&self) -> &[ModeTransition] {
        &self.transitions
    }

    pub fn policy(&self) -> &SwitchPolicy {
        &self.policy
    }

    fn update_mode(&mut self, t: f64, state: &AcrobotState) {
        let (Some(_), Some(stabilizer)) = (&self.swing_up, &self.stabilizer) else {
            return;
        };
        let distance = self.policy.distance(state, stabilizer.target());
        let next = self.policy.next_mode(self.mode, distance);
        if next != self.mode {
            info!(
                "t = {t:.3} s: switching {:?} -> {:?} (distance {distance:.4} rad)",
                self.mode, next
            );
            self.transitions.push(ModeTransition {
                t,
                from: self.mode,
                to: next,
            });
            self.mode = next;
        }
    }

    /// Raw torque of the active law before saturation.
    fn raw_torque(&self, state: &AcrobotState) -> f64 {
        let law: Option<&dyn TorqueLaw> = match self.mode {
            ControlMode::SwingUp => self.swing_up.as_ref().map(|law| law as &dyn TorqueLaw),
            ControlMode::Stabilize => self.stabilizer.as_ref().map(|law| law as &dyn TorqueLaw),
        };
        law.map_or(0.0, |law| law.torque(&self.plant, state))
    }
}

impl Model for AcrobotController {
    fn reset(&mut self) {
        self.mode = self.initial_mode;
        self.transitions.clear();
    }
}

impl ControlModel for AcrobotController {
    fn compute_torque(&mut self, ctx: SimContext, state: &AcrobotState) -> f64 {
        self.update_mode(ctx.t, state);
        self.plant.params().saturate(self.raw_torque(state))
    }
}

/// Constant elbow torque, saturated once at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenLoop {
    torque: f64,
}

impl OpenLoop {
    pub fn new(params: &AcrobotParams, torque: f64) -> Self {
        OpenLoop {
            torque: params.saturate(torque),
        }
    }

    pub fn passive() -> Self {
        OpenLoop { torque: 0.0 }
    }

    pub fn torque(&self) -> f64 {
        self.torque
    }
}

impl Model for OpenLoop {
    fn reset(&mut self) {}
}

impl ControlModel for OpenLoop {
    fn compute_torque(&mut self, _ctx: SimContext, _state: &AcrobotState) -> f64 {
        self.torque
    }
}
