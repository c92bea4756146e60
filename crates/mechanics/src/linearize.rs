//! Linearization of the acrobot about an equilibrium.
//!
//! At an equilibrium the Coriolis terms vanish together with their first
//! derivatives, so only the gravity gradient, the damping and the input
//! direction survive:
//!
//! ```text
//! A = [ 0            I       ]     B = [ 0            ]
//!     [ -M⁻¹·∂G/∂q   -b·M⁻¹  ]         [ M⁻¹·(0, 1)ᵀ  ]
//! ```

use log::debug;
use nalgebra::{Matrix2, Matrix4, Vector2, Vector4};
use simcore::AcrobotState;

use crate::dynamics::{Acrobot, solve_2x2};
use crate::error::{DynamicsError, DynamicsResult};

/// Continuous-time linear model `ẋ = A·x + B·u` in error coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearSystem {
    pub a: Matrix4<f64>,
    pub b: Vector4<f64>,
}

impl LinearSystem {
    /// `[B, AB, A²B, A³B]`
    pub fn controllability_matrix(&self) -> Matrix4<f64> {
        let ab = self.a * self.b;
        let a2b = self.a * ab;
        let a3b = self.a * a2b;
        Matrix4::from_columns(&[self.b, ab, a2b, a3b])
    }

    /// Full rank test of the controllability matrix, relative to its largest
    /// singular value.
    pub fn is_controllable(&self, tolerance: f64) -> bool {
        let sv = self.controllability_matrix().svd(false, false).singular_values;
        let largest = sv.max();
        largest > 0.0 && sv.min() > tolerance * largest
    }
}

impl Acrobot {
    /// Analytic linearization about `equilibrium` with zero torque.
    pub fn linearize(&self, equilibrium: &AcrobotState) -> DynamicsResult<LinearSystem> {
        let p = *self.params();
        let gravity = self.gravity(equilibrium);
        let residual = gravity
            .abs()
            .max()
            .max(equilibrium.omega1.abs())
            .max(equilibrium.omega2.abs());
        let scale = (p.m1 + p.m2) * p.g * p.l1 + p.m2 * p.g * p.l2;
        if !(residual <= 1e-9 * scale) {
            return Err(DynamicsError::NotAnEquilibrium { residual });
        }

        let theta2 = equilibrium.theta2;
        let m = self.mass_matrix(theta2);
        let m_inv = Matrix2::from_columns(&[
            solve_2x2(&m, &Vector2::new(1.0, 0.0), theta2)?,
            solve_2x2(&m, &Vector2::new(0.0, 1.0), theta2)?,
        ]);
        let stiffness = -m_inv * self.gravity_jacobian(equilibrium.theta1, theta2);
        let damping = -m_inv * p.b;
        let input = m_inv.column(1).into_owned();

        let mut a = Matrix4::zeros();
        a.fixed_view_mut::<2, 2>(0, 2).copy_from(&Matrix2::identity());
        a.fixed_view_mut::<2, 2>(2, 0).copy_from(&stiffness);
        a.fixed_view_mut::<2, 2>(2, 2).copy_from(&damping);
        let b = Vector4::new(0.0, 0.0, input[0], input[1]);

        debug!("Linearized about {equilibrium:?}: A = {a}, B = {b}");
        Ok(LinearSystem { a, b })
    }

    /// Central-difference Jacobians of the full nonlinear derivative.
    ///
    /// Works about any operating point; `torque` should sit strictly inside the
    /// actuator limit or the input column sees the saturation.
    pub fn linearize_numeric(
        &self,
        state: &AcrobotState,
        torque: f64,
        eps: f64,
    ) -> DynamicsResult<LinearSystem> {
        let x0 = state.to_vector();
        let mut a = Matrix4::zeros();
        for j in 0..4 {
            let mut hi = x0;
            let mut lo = x0;
            hi[j] += eps;
            lo[j] -= eps;
            let column = (self.derivative(&AcrobotState::from_vector(&hi), torque)?
                - self.derivative(&AcrobotState::from_vector(&lo), torque)?)
                / (2.0 * eps);
            a.set_column(j, &column);
        }
        let b = (self.derivative(state, torque + eps)? - self.derivative(state, torque - eps)?)
            / (2.0 * eps);
        Ok(LinearSystem { a, b })
    }
}
