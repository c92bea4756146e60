use nalgebra::SVector;
use serde::{Deserialize, Serialize};

/// A generic integration strategy trait.
///
/// `f(t, x, u)` evaluates the state derivative. The control input `u` is held
/// constant over the whole step (zero-order hold). Derivative evaluation may fail,
/// in which case the error is returned unchanged.
pub trait Integrator {
    /// Advances the state by one timestep.
    fn step<const N: usize, E, F>(
        &self,
        f: F,
        t: f64,
        x: &SVector<f64, N>,
        u: f64,
        dt: f64,
    ) -> Result<SVector<f64, N>, E>
    where
        F: Fn(f64, &SVector<f64, N>, f64) -> Result<SVector<f64, N>, E>;
}

/// Explicit (forward) Euler integrator.
/// First-order accurate with O(dt²) local error. Cheap, but it steadily pumps
/// energy into undamped oscillators and can go unstable on fast swings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitEuler;

impl Integrator for ExplicitEuler {
    fn step<const N: usize, E, F>(
        &self,
        f: F,
        t: f64,
        x: &SVector<f64, N>,
        u: f64,
        dt: f64,
    ) -> Result<SVector<f64, N>, E>
    where
        F: Fn(f64, &SVector<f64, N>, f64) -> Result<SVector<f64, N>, E>,
    {
        let dx = f(t, x, u)?;
        Ok(x + dx * dt)
    }
}

/// Fourth-order Runge-Kutta integrator.
/// O(dt⁵) local error. Evaluates the derivative four times per step.
#[derive(Debug, Clone, Copy, Default)]
pub struct RungeKutta4;

impl Integrator for RungeKutta4 {
    fn step<const N: usize, E, F>(
        &self,
        f: F,
        t: f64,
        x: &SVector<f64, N>,
        u: f64,
        dt: f64,
    ) -> Result<SVector<f64, N>, E>
    where
        F: Fn(f64, &SVector<f64, N>, f64) -> Result<SVector<f64, N>, E>,
    {
        let half = 0.5 * dt;
        let k1 = f(t, x, u)?;
        let k2 = f(t + half, &(x + k1 * half), u)?;
        let k3 = f(t + half, &(x + k2 * half), u)?;
        let k4 = f(t + dt, &(x + k3 * dt), u)?;

        Ok(x + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0))
    }
}

/// Run-time selectable integration scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationScheme {
    Euler,
    #[default]
    Rk4,
}

impl Integrator for IntegrationScheme {
    fn step<const N: usize, E, F>(
        &self,
        f: F,
        t: f64,
        x: &SVector<f64, N>,
        u: f64,
        dt: f64,
    ) -> Result<SVector<f64, N>, E>
    where
        F: Fn(f64, &SVector<f64, N>, f64) -> Result<SVector<f64, N>, E>,
    {
        match self {
            IntegrationScheme::Euler => ExplicitEuler.step(f, t, x, u, dt),
            IntegrationScheme::Rk4 => RungeKutta4.step(f, t, x, u, dt),
        }
    }
}

/// Splits every step into `substeps` equal sub-steps of the wrapped integrator.
///
/// This lets the physics run faster than the controller: the torque passed in
/// is held for all sub-steps.
#[derive(Debug, Clone, Copy)]
pub struct Substepped<I: Integrator> {
    pub integrator: I,
    pub substeps: u32,
}

impl<I: Integrator> Substepped<I> {
    pub fn new(integrator: I, substeps: u32) -> Self {
        Substepped {
            integrator,
            substeps: substeps.max(1),
        }
    }
}

impl<I: Integrator> Integrator for Substepped<I> {
    fn step<const N: usize, E, F>(
        &self,
        f: F,
        t: f64,
        x: &SVector<f64, N>,
        u: f64,
        dt: f64,
    ) -> Result<SVector<f64, N>, E>
    where
        F: Fn(f64, &SVector<f64, N>, f64) -> Result<SVector<f64, N>, E>,
    {
        let n = self.substeps.max(1);
        let h = dt / n as f64;
        let mut state = *x;
        for i in 0..n {
            state = self.integrator.step(&f, t + i as f64 * h, &state, u, h)?;
        }
        Ok(state)
    }
}
