//! Mechanical energy of the acrobot.
//!
//! Potential energy is measured from the shoulder height and is consistent with
//! the gravity torques of the dynamics (`G = ∂V/∂q`), so total energy is
//! conserved exactly by the undamped, unforced equations of motion.

use nalgebra::Vector2;
use simcore::AcrobotState;

use crate::dynamics::Acrobot;

impl Acrobot {
    /// Kinetic energy `½·ωᵀ·M(θ2)·ω`.
    pub fn kinetic_energy(&self, state: &AcrobotState) -> f64 {
        let omega = Vector2::new(state.omega1, state.omega2);
        0.5 * omega.dot(&(self.mass_matrix(state.theta2) * omega))
    }

    pub fn potential_energy(&self, state: &AcrobotState) -> f64 {
        let p = self.params();
        -(p.m1 + p.m2) * p.g * p.l1 * state.theta1.cos()
            - p.m2 * p.g * p.l2 * (state.theta1 + state.theta2).cos()
    }

    pub fn total_energy(&self, state: &AcrobotState) -> f64 {
        self.kinetic_energy(state) + self.potential_energy(state)
    }

    /// Energy of the upright equilibrium, the swing-up target.
    pub fn upright_energy(&self) -> f64 {
        self.total_energy(&AcrobotState::upright())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::AcrobotParams;
    use approx::assert_relative_eq;
    use simcore::{ExplicitEuler, Integrator, RungeKutta4};

    fn acrobot() -> Acrobot {
        Acrobot::new(AcrobotParams::default()).unwrap()
    }

    fn max_energy_drift<I: Integrator>(integrator: &I, dt: f64, seconds: f64) -> f64 {
        let plant = acrobot();
        let field = plant.vector_field();
        let start = AcrobotState::new(std::f64::consts::FRAC_PI_2, 0.3, 0.0, 0.0);
        let e0 = plant.total_energy(&start);

        let mut x = start.to_vector();
        let mut drift: f64 = 0.0;
        let steps = (seconds / dt).round() as usize;
        for i in 0..steps {
            x = integrator.step(&field, i as f64 * dt, &x, 0.0, dt).unwrap();
            let e = plant.total_energy(&AcrobotState::from_vector(&x));
            drift = drift.max((e - e0).abs());
        }
        drift
    }

    #[test]
    fn test_upright_energy_value() {
        // (m1 + m2)·g·L1 + m2·g·L2 = 2·9.8·0.5 + 9.8·0.5
        assert_relative_eq!(acrobot().upright_energy(), 14.7, epsilon = 1e-12);
    }

    #[test]
    fn test_hanging_energy_is_minimum() {
        let plant = acrobot();
        let hanging = plant.total_energy(&AcrobotState::hanging());
        assert_relative_eq!(hanging, -14.7, epsilon = 1e-12);
        let nudged = plant.total_energy(&AcrobotState::new(0.1, -0.1, 0.0, 0.0));
        assert!(nudged > hanging);
    }

    #[test]
    fn test_kinetic_energy_matches_quadratic_form() {
        let plant = acrobot();
        let state = AcrobotState::new(0.0, 0.0, 1.0, -2.0);
        // M(0) = [[2.75, 1.25], [1.25, 1]]
        let expected = 0.5 * (2.75 * 1.0 - 2.0 * 1.25 * 2.0 + 1.0 * 4.0);
        assert_relative_eq!(plant.kinetic_energy(&state), expected, epsilon = 1e-12);
        assert!(plant.kinetic_energy(&AcrobotState::new(0.3, 1.0, 0.0, 0.0)) == 0.0);
    }

    #[test]
    fn test_potential_gradient_matches_gravity_torque() {
        let plant = acrobot();
        let (t1, t2) = (0.8, -0.4);
        let eps = 1e-6;
        let v = |a: f64, b: f64| plant.potential_energy(&AcrobotState::new(a, b, 0.0, 0.0));
        let grad = Vector2::new(
            (v(t1 + eps, t2) - v(t1 - eps, t2)) / (2.0 * eps),
            (v(t1, t2 + eps) - v(t1, t2 - eps)) / (2.0 * eps),
        );
        let g = plant.gravity(&AcrobotState::new(t1, t2, 0.0, 0.0));
        assert_relative_eq!(grad, g, epsilon = 1e-6);
    }

    #[test]
    fn test_rk4_conserves_energy() {
        let drift = max_energy_drift(&RungeKutta4, 0.01, 5.0);
        assert!(drift < 1e-6, "drift = {drift}");
    }

    #[test]
    fn test_rk4_drift_shrinks_with_step() {
        let coarse = max_energy_drift(&RungeKutta4, 0.01, 5.0);
        let fine = max_energy_drift(&RungeKutta4, 0.005, 5.0);
        assert!(fine < coarse / 4.0, "coarse = {coarse}, fine = {fine}");
    }

    #[test]
    fn test_euler_drifts_far_more_than_rk4() {
        let euler = max_energy_drift(&ExplicitEuler, 0.01, 5.0);
        let rk4 = max_energy_drift(&RungeKutta4, 0.01, 5.0);
        assert!(euler > 0.1, "euler drift = {euler}");
        assert!(euler > 1000.0 * rk4);
    }
}
