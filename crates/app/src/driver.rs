//! Fixed-step simulation driver
//!
//! Each step asks the controller for a torque, advances the plant with the
//! chosen integrator and hands the new sample to a sink. Any non-finite
//! torque or state ends the run; nothing after the last finite state is
//! recorded.

use std::io::{self, Write};
use std::ops::ControlFlow;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use simcore::{
    AcrobotState, ControlModel, IntegrationScheme, Integrator, Model, SimContext, Substepped,
};

use control::state_error;
use mechanics::Acrobot;

use crate::config::SimulationConfig;
use crate::error::{ConfigError, SimulationError, SimulationFailure};

/// One recorded point of a trajectory.
///
/// `torque` is the (saturated) torque that was held over the step leading to
/// `state`; the initial sample carries zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub step: usize,
    pub t: f64,
    pub state: AcrobotState,
    pub torque: f64,
}

/// Consumer of samples as they are produced.
///
/// Returning `ControlFlow::Break` stops the run after the current sample.
pub trait TrajectorySink {
    fn record(&mut self, sample: &Sample) -> ControlFlow<()>;
}

impl<F: FnMut(&Sample) -> ControlFlow<()>> TrajectorySink for F {
    fn record(&mut self, sample: &Sample) -> ControlFlow<()> {
        self(sample)
    }
}

/// In-memory trajectory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub samples: Vec<Sample>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Trajectory {
            samples: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn final_state(&self) -> Option<AcrobotState> {
        self.last().map(|sample| sample.state)
    }

    pub fn states(&self) -> impl Iterator<Item = &AcrobotState> + '_ {
        self.samples.iter().map(|sample| &sample.state)
    }

    /// Largest |torque| applied over the run.
    pub fn peak_torque(&self) -> f64 {
        self.samples
            .iter()
            .map(|sample| sample.torque.abs())
            .fold(0.0, f64::max)
    }

    /// Write the samples as CSV with a header row.
    pub fn write_csv<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "step,t,theta1,theta2,omega1,omega2,torque")?;
        for s in &self.samples {
            writeln!(
                out,
                "{},{:.6},{:.9},{:.9},{:.9},{:.9},{:.6}",
                s.step,
                s.t,
                s.state.theta1,
                s.state.theta2,
                s.state.omega1,
                s.state.omega2,
                s.torque
            )?;
        }
        Ok(())
    }
}

impl TrajectorySink for Trajectory {
    fn record(&mut self, sample: &Sample) -> ControlFlow<()> {
        self.samples.push(*sample);
        ControlFlow::Continue(())
    }
}

/// How a run without errors ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    /// The sink asked to stop after recording this step
    Cancelled { at_step: usize },
}

/// Step the plant `num_steps` times, streaming every sample into `sink`.
///
/// The initial state is recorded as step 0, so a completed run produces
/// `num_steps + 1` samples.
pub fn run_with_sink<C, I, S>(
    plant: &Acrobot,
    initial_state: AcrobotState,
    controller: &mut C,
    integrator: &I,
    num_steps: usize,
    dt: f64,
    sink: &mut S,
) -> Result<RunStatus, SimulationError>
where
    C: ControlModel + ?Sized,
    I: Integrator,
    S: TrajectorySink + ?Sized,
{
    if !dt.is_finite() || dt <= 0.0 {
        return Err(SimulationError::InvalidTimeStep { dt });
    }
    if !initial_state.is_finite() {
        return Err(SimulationError::NumericalDivergence {
            step: 0,
            last_state: initial_state,
        });
    }

    let field = plant.vector_field();
    let mut state = initial_state;
    let initial = Sample {
        step: 0,
        t: 0.0,
        state,
        torque: 0.0,
    };
    if sink.record(&initial).is_break() {
        return Ok(RunStatus::Cancelled { at_step: 0 });
    }

    for step in 1..=num_steps {
        let t = (step - 1) as f64 * dt;
        let torque = controller.compute_torque(SimContext { dt, t }, &state);
        if !torque.is_finite() {
            return Err(SimulationError::NumericalDivergence {
                step,
                last_state: state,
            });
        }

        let next = integrator
            .step(&field, t, &state.to_vector(), torque, dt)
            .map_err(|source| SimulationError::Dynamics { step, source })?;
        let next = AcrobotState::from_vector(&next);
        if !next.is_finite() {
            return Err(SimulationError::NumericalDivergence {
                step,
                last_state: state,
            });
        }
        state = next;

        let sample = Sample {
            step,
            t: step as f64 * dt,
            state,
            torque,
        };
        if sink.record(&sample).is_break() {
            return Ok(RunStatus::Cancelled { at_step: step });
        }
    }
    Ok(RunStatus::Completed)
}

/// Run to completion and collect the trajectory.
///
/// On failure the samples recorded so far come back with the error.
pub fn run<C, I>(
    plant: &Acrobot,
    initial_state: AcrobotState,
    controller: &mut C,
    integrator: &I,
    num_steps: usize,
    dt: f64,
) -> Result<Trajectory, SimulationFailure>
where
    C: ControlModel + ?Sized,
    I: Integrator,
{
    let mut trajectory = Trajectory::with_capacity(num_steps + 1);
    match run_with_sink(
        plant,
        initial_state,
        controller,
        integrator,
        num_steps,
        dt,
        &mut trajectory,
    ) {
        Ok(_) => Ok(trajectory),
        Err(error) => Err(SimulationFailure { error, trajectory }),
    }
}

/// A fully configured simulation: validated plant, built controller and integrator.
pub struct Simulation {
    plant: Acrobot,
    initial_state: AcrobotState,
    equilibrium: AcrobotState,
    controller: Box<dyn ControlModel + Send>,
    integrator: Substepped<IntegrationScheme>,
    num_steps: usize,
    dt: f64,
}

impl Simulation {
    /// Validate the configuration and set everything up; no step runs yet.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let plant = Acrobot::new(config.params)?;
        let controller = config.controller.build(&config.params, &config.equilibrium)?;
        Ok(Simulation {
            plant,
            initial_state: config.initial_state,
            equilibrium: config.equilibrium,
            controller,
            integrator: Substepped::new(config.integrator, config.substeps),
            num_steps: config.num_steps(),
            dt: config.dt,
        })
    }

    /// Start from `initial_state` instead of the configured one.
    pub fn with_initial_state(mut self, initial_state: AcrobotState) -> Self {
        self.initial_state = initial_state;
        self
    }

    pub fn plant(&self) -> &Acrobot {
        &self.plant
    }

    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    /// Reset the controller and stream a fresh run into `sink`.
    pub fn run_with_sink<S: TrajectorySink + ?Sized>(
        &mut self,
        sink: &mut S,
    ) -> Result<RunStatus, SimulationError> {
        self.controller.reset();
        run_with_sink(
            &self.plant,
            self.initial_state,
            &mut self.controller,
            &self.integrator,
            self.num_steps,
            self.dt,
            sink,
        )
    }

    /// Reset the controller and run to completion.
    pub fn run(&mut self) -> Result<Trajectory, SimulationFailure> {
        self.controller.reset();
        let result = run(
            &self.plant,
            self.initial_state,
            &mut self.controller,
            &self.integrator,
            self.num_steps,
            self.dt,
        );
        match &result {
            Ok(trajectory) => {
                if let Some(last) = trajectory.last() {
                    let error = state_error(&last.state, &self.equilibrium);
                    info!(
                        "Simulated {:.2} s in {} steps, final distance to target {:.3e}",
                        last.t,
                        last.step,
                        error.amax()
                    );
                }
            }
            Err(failure) => warn!("{failure}"),
        }
        result
    }
}
