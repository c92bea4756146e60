//! Continuous-time LQR synthesis
//!
//! Solves the algebraic Riccati equation
//!
//! ```text
//! Aᵀ·S + S·A − S·B·R⁻¹·Bᵀ·S + Q = 0
//! ```
//!
//! with the matrix sign function of the Hamiltonian
//! `H = [[A, −B·R⁻¹·Bᵀ], [−Q, −Aᵀ]]`. The iteration `Z ← ½(c·Z + Z⁻¹/c)`
//! converges quadratically to `W = sign(H)`, and the stabilizing solution is
//! the least-squares solution of `[W12; W22 + I]·S = −[W11 + I; W21]`.

use log::debug;
use nalgebra::{Matrix4, RowVector4, SMatrix, Vector4};
use serde::{Deserialize, Serialize};

use mechanics::LinearSystem;

use crate::error::{ControlError, ControlResult};

type Matrix8 = SMatrix<f64, 8, 8>;
type Matrix8x4 = SMatrix<f64, 8, 4>;

const MAX_SIGN_ITERATIONS: usize = 100;
const SIGN_TOLERANCE: f64 = 1e-12;
const RESIDUAL_TOLERANCE: f64 = 1e-9;
const CONTROLLABILITY_TOLERANCE: f64 = 1e-10;

/// Diagonal state weights and scalar input weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostWeights {
    /// Diagonal of Q for (θ1, θ2, ω1, ω2)
    pub q_diag: [f64; 4],
    /// Input weight R
    pub r: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        CostWeights {
            q_diag: [10.0, 10.0, 1.0, 1.0],
            r: 1.0,
        }
    }
}

impl CostWeights {
    pub fn new(q_diag: [f64; 4], r: f64) -> Self {
        CostWeights { q_diag, r }
    }

    pub fn q_matrix(&self) -> Matrix4<f64> {
        Matrix4::from_diagonal(&Vector4::from(self.q_diag))
    }

    /// Q must be positive semi-definite and R positive.
    pub fn validate(&self) -> ControlResult<()> {
        if let Some(q) = self.q_diag.iter().find(|q| !q.is_finite() || **q < 0.0) {
            return Err(ControlError::InvalidCostWeights(format!(
                "Q diagonal entry {q} is not a finite non-negative number"
            )));
        }
        if !self.r.is_finite() || self.r <= 0.0 {
            return Err(ControlError::InvalidCostWeights(format!(
                "R = {} is not a finite positive number",
                self.r
            )));
        }
        Ok(())
    }
}

/// State-feedback gain together with the Riccati solution it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LqrGain {
    pub k: RowVector4<f64>,
    pub s: Matrix4<f64>,
}

impl LqrGain {
    /// `A − B·K`
    pub fn closed_loop(&self, system: &LinearSystem) -> Matrix4<f64> {
        system.a - system.b * self.k
    }

    /// Quadratic cost-to-go `eᵀ·S·e` of a state error.
    pub fn cost_to_go(&self, error: &Vector4<f64>) -> f64 {
        error.dot(&(self.s * error))
    }

    /// Unsaturated feedback torque `−K·e`.
    pub fn feedback(&self, error: &Vector4<f64>) -> f64 {
        -(self.k * error)[0]
    }
}

/// Solve the continuous-time algebraic Riccati equation for a single-input system.
pub fn solve_care(
    a: &Matrix4<f64>,
    b: &Vector4<f64>,
    q: &Matrix4<f64>,
    r: f64,
) -> ControlResult<Matrix4<f64>> {
    let g = b * b.transpose() / r;

    let mut h = Matrix8::zeros();
    h.fixed_view_mut::<4, 4>(0, 0).copy_from(a);
    h.fixed_view_mut::<4, 4>(0, 4).copy_from(&(-g));
    h.fixed_view_mut::<4, 4>(4, 0).copy_from(&(-q));
    h.fixed_view_mut::<4, 4>(4, 4).copy_from(&(-a.transpose()));

    let w = matrix_sign(&h)?;
    let identity = Matrix4::<f64>::identity();
    let w11 = w.fixed_view::<4, 4>(0, 0).into_owned();
    let w12 = w.fixed_view::<4, 4>(0, 4).into_owned();
    let w21 = w.fixed_view::<4, 4>(4, 0).into_owned();
    let w22 = w.fixed_view::<4, 4>(4, 4).into_owned();

    let mut lhs = Matrix8x4::zeros();
    lhs.fixed_view_mut::<4, 4>(0, 0).copy_from(&w12);
    lhs.fixed_view_mut::<4, 4>(4, 0).copy_from(&(w22 + identity));
    let mut rhs = Matrix8x4::zeros();
    rhs.fixed_view_mut::<4, 4>(0, 0).copy_from(&(-(w11 + identity)));
    rhs.fixed_view_mut::<4, 4>(4, 0).copy_from(&(-w21));

    // Normal equations of the overdetermined 8×4 system
    let normal = lhs.transpose() * lhs;
    let x = normal
        .cholesky()
        .ok_or(ControlError::RiccatiDidNotConverge {
            iterations: MAX_SIGN_ITERATIONS,
        })?
        .solve(&(lhs.transpose() * rhs));
    let s = (x + x.transpose()) * 0.5;

    let residual = a.transpose() * s + s * a - s * g * s + q;
    let scale = q.norm() + 2.0 * a.norm() * s.norm() + g.norm() * s.norm_squared();
    let relative = residual.norm() / scale.max(f64::MIN_POSITIVE);
    if !relative.is_finite() || relative > RESIDUAL_TOLERANCE {
        return Err(ControlError::RiccatiResidual { residual: relative });
    }
    Ok(s)
}

/// Scaled Newton iteration for the matrix sign function.
fn matrix_sign(h: &Matrix8) -> ControlResult<Matrix8> {
    let mut z = *h;
    for iteration in 0..MAX_SIGN_ITERATIONS {
        let z_inv = z
            .try_inverse()
            .ok_or(ControlError::RiccatiDidNotConverge { iterations: iteration })?;
        let c = (z_inv.norm() / z.norm()).sqrt();
        let next = (z * c + z_inv / c) * 0.5;
        let change = (next - z).norm() / next.norm();
        z = next;
        if !change.is_finite() {
            break;
        }
        if change < SIGN_TOLERANCE {
            debug!("Matrix sign iteration converged after {} steps", iteration + 1);
            return Ok(z);
        }
    }
    Err(ControlError::RiccatiDidNotConverge {
        iterations: MAX_SIGN_ITERATIONS,
    })
}

/// Design an LQR gain for a linearized system.
///
/// Fails up front for an uncontrollable pair and afterwards if the closed loop
/// is not strictly stable.
pub fn solve_lqr(system: &LinearSystem, weights: &CostWeights) -> ControlResult<LqrGain> {
    weights.validate()?;
    if !system.is_controllable(CONTROLLABILITY_TOLERANCE) {
        return Err(ControlError::UncontrollableSystem);
    }

    let s = solve_care(&system.a, &system.b, &weights.q_matrix(), weights.r)?;
    let k = system.b.transpose() * s / weights.r;
    let gain = LqrGain { k, s };

    let max_real_part = gain
        .closed_loop(system)
        .complex_eigenvalues()
        .iter()
        .map(|lambda| lambda.re)
        .fold(f64::NEG_INFINITY, f64::max);
    if !(max_real_part < 0.0) {
        return Err(ControlError::NotStabilizing { max_real_part });
    }

    debug!("LQR gain K = {k}, slowest closed-loop pole at Re = {max_real_part:.4}");
    Ok(gain)
}
