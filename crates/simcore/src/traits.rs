use std::f64::consts::PI;

use nalgebra::Vector4;
use serde::{Deserialize, Serialize};

// Mechanical State

/// Joint-space state of the acrobot.
///
/// Angles are in radians and unbounded; `theta2` is the elbow angle relative
/// to the first link. Velocities are in rad/s.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AcrobotState {
    pub theta1: f64,
    pub theta2: f64,
    pub omega1: f64,
    pub omega2: f64,
}

impl AcrobotState {
    pub fn new(theta1: f64, theta2: f64, omega1: f64, omega2: f64) -> Self {
        AcrobotState {
            theta1,
            theta2,
            omega1,
            omega2,
        }
    }

    /// Both links pointing straight up, at rest.
    pub fn upright() -> Self {
        AcrobotState::new(PI, 0.0, 0.0, 0.0)
    }

    /// Both links hanging straight down, at rest.
    pub fn hanging() -> Self {
        AcrobotState::default()
    }

    pub fn to_vector(&self) -> Vector4<f64> {
        Vector4::new(self.theta1, self.theta2, self.omega1, self.omega2)
    }

    pub fn from_vector(x: &Vector4<f64>) -> Self {
        AcrobotState::new(x[0], x[1], x[2], x[3])
    }

    pub fn is_finite(&self) -> bool {
        self.theta1.is_finite()
            && self.theta2.is_finite()
            && self.omega1.is_finite()
            && self.omega2.is_finite()
    }
}

// General Traits

#[derive(Debug, Clone, Copy)]
pub struct SimContext {
    pub dt: f64,
    pub t: f64,
}

pub trait Model {
    fn reset(&mut self);
}

/// A controller producing the elbow torque for the current state.
///
/// Implementors return a torque that is already saturated to the actuator limit.
pub trait ControlModel: Model {
    fn compute_torque(&mut self, ctx: SimContext, state: &AcrobotState) -> f64;
}

impl<C: ControlModel + ?Sized> Model for Box<C> {
    fn reset(&mut self) {
        (**self).reset();
    }
}

impl<C: ControlModel + ?Sized> ControlModel for Box<C> {
    fn compute_torque(&mut self, ctx: SimContext, state: &AcrobotState) -> f64 {
        (**self).compute_torque(ctx, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_conversion_preserves_order() {
        let state = AcrobotState::new(0.1, -0.2, 0.3, -0.4);
        let x = state.to_vector();
        assert_eq!(x, Vector4::new(0.1, -0.2, 0.3, -0.4));
        assert_eq!(AcrobotState::from_vector(&x), state);
    }

    #[test]
    fn test_is_finite_detects_nan_and_inf() {
        assert!(AcrobotState::upright().is_finite());
        assert!(!AcrobotState::new(f64::NAN, 0.0, 0.0, 0.0).is_finite());
        assert!(!AcrobotState::new(0.0, 0.0, 0.0, f64::INFINITY).is_finite());
    }

    #[test]
    fn test_boxed_controller_delegates() {
        struct Constant(f64, usize);
        impl Model for Constant {
            fn reset(&mut self) {
                self.1 += 1;
            }
        }
        impl ControlModel for Constant {
            fn compute_torque(&mut self, _ctx: SimContext, _state: &AcrobotState) -> f64 {
                self.0
            }
        }

        let mut boxed: Box<Constant> = Box::new(Constant(2.5, 0));
        let ctx = SimContext { dt: 0.01, t: 0.0 };
        assert!((boxed.compute_torque(ctx, &AcrobotState::hanging()) - 2.5).abs() < 1e-12);
        boxed.reset();
        assert_eq!(boxed.1, 1);
    }
}
