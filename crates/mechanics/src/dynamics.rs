//! Acrobot equations of motion
//!
//! Manipulator form `M(q)·q̈ + C(q, q̇) + G(q) + b·q̇ = (0, u)`:
//! - `M` depends only on the elbow angle
//! - `C` collects the Coriolis and centrifugal terms
//! - `G` is the gravity torque, zero when both links point straight up or down
//!
//! The torque acts only at the elbow and is clamped to the actuator limit
//! before it enters the equations.

use nalgebra::{Matrix2, Vector2, Vector4};
use simcore::AcrobotState;

use crate::error::{DynamicsError, DynamicsResult};
use crate::params::AcrobotParams;

/// The acrobot plant: validated parameters plus the equations of motion.
#[derive(Debug, Clone, Copy)]
pub struct Acrobot {
    params: AcrobotParams,
}

impl Acrobot {
    /// Create a plant, rejecting parameters that cannot describe a real acrobot.
    pub fn new(params: AcrobotParams) -> DynamicsResult<Self> {
        params.validate()?;
        Ok(Acrobot { params })
    }

    pub fn params(&self) -> &AcrobotParams {
        &self.params
    }

    /// Mass-inertia matrix `M(θ2)`.
    pub fn mass_matrix(&self, theta2: f64) -> Matrix2<f64> {
        let c2 = theta2.cos();
        let m11 = self.params.m11(c2);
        let m12 = self.params.m12(c2);
        Matrix2::new(m11, m12, m12, self.params.i2)
    }

    /// Coriolis and centrifugal torques `C(q, q̇)`.
    pub fn coriolis(&self, state: &AcrobotState) -> Vector2<f64> {
        let h = self.params.coupling() * state.theta2.sin();
        let (w1, w2) = (state.omega1, state.omega2);
        Vector2::new(-h * w2 * (2.0 * w1 + w2), h * w1 * w1)
    }

    /// Gravity torques `G(q)`.
    pub fn gravity(&self, state: &AcrobotState) -> Vector2<f64> {
        let p = &self.params;
        let elbow = p.m2 * p.g * p.l2 * (state.theta1 + state.theta2).sin();
        let shoulder = (p.m1 + p.m2) * p.g * p.l1 * state.theta1.sin() + elbow;
        Vector2::new(shoulder, elbow)
    }

    /// Partial derivatives `∂G/∂q` of the gravity torques.
    pub fn gravity_jacobian(&self, theta1: f64, theta2: f64) -> Matrix2<f64> {
        let p = &self.params;
        let elbow = p.m2 * p.g * p.l2 * (theta1 + theta2).cos();
        let shoulder = (p.m1 + p.m2) * p.g * p.l1 * theta1.cos();
        Matrix2::new(shoulder + elbow, elbow, elbow, elbow)
    }

    /// Joint accelerations for a (saturated) elbow torque.
    pub fn acceleration(&self, state: &AcrobotState, torque: f64) -> DynamicsResult<Vector2<f64>> {
        let u = self.params.saturate(torque);
        let damping = Vector2::new(state.omega1, state.omega2) * self.params.b;
        let rhs = Vector2::new(0.0, u) - self.coriolis(state) - self.gravity(state) - damping;
        solve_2x2(&self.mass_matrix(state.theta2), &rhs, state.theta2)
    }

    /// State derivative `(ω1, ω2, α1, α2)`.
    pub fn derivative(&self, state: &AcrobotState, torque: f64) -> DynamicsResult<Vector4<f64>> {
        let alpha = self.acceleration(state, torque)?;
        Ok(Vector4::new(state.omega1, state.omega2, alpha[0], alpha[1]))
    }

    /// The derivative in the `f(t, x, u)` shape expected by the integrators.
    pub fn vector_field(
        &self,
    ) -> impl Fn(f64, &Vector4<f64>, f64) -> DynamicsResult<Vector4<f64>> + '_ {
        move |_t: f64, x: &Vector4<f64>, u: f64| self.derivative(&AcrobotState::from_vector(x), u)
    }
}

/// Closed-form solve of `M·a = rhs` for a symmetric 2×2 mass matrix.
pub(crate) fn solve_2x2(
    m: &Matrix2<f64>,
    rhs: &Vector2<f64>,
    theta2: f64,
) -> DynamicsResult<Vector2<f64>> {
    let determinant = m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)];
    let scale = (m[(0, 0)] * m[(1, 1)]).abs() + (m[(0, 1)] * m[(1, 0)]).abs();
    if !determinant.is_finite() || determinant.abs() <= f64::EPSILON * scale {
        return Err(DynamicsError::SingularMassMatrix {
            theta2,
            determinant,
        });
    }

    Ok(Vector2::new(
        (m[(1, 1)] * rhs[0] - m[(0, 1)] * rhs[1]) / determinant,
        (m[(0, 0)] * rhs[1] - m[(1, 0)] * rhs[0]) / determinant,
    ))
}
