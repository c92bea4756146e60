//! Parallel batches of independent runs
//!
//! Runs share nothing mutable: every worker builds its own controller from the
//! configuration and owns its state, so they parallelize with rayon directly.

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use simcore::AcrobotState;

use control::state_error;

use crate::config::SimulationConfig;
use crate::driver::Simulation;
use crate::error::{ConfigError, SimulationError};

/// Result of a single run in a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub initial_state: AcrobotState,
    /// Final state of a completed run, or the failure
    pub result: Result<AcrobotState, SimulationError>,
}

impl BatchOutcome {
    /// Largest wrapped deviation of the final state from `target`.
    pub fn final_distance(&self, target: &AcrobotState) -> Option<f64> {
        self.result
            .as_ref()
            .ok()
            .map(|state| state_error(state, target).amax())
    }
}

/// Aggregate over a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub outcomes: Vec<BatchOutcome>,
    pub completed: usize,
    pub failed: usize,
    /// Final distance to the equilibrium of every completed run
    pub final_distances: Vec<f64>,
}

impl BatchSummary {
    fn from_outcomes(outcomes: Vec<BatchOutcome>, target: &AcrobotState) -> Self {
        let final_distances: Vec<f64> = outcomes
            .iter()
            .filter_map(|outcome| outcome.final_distance(target))
            .collect();
        let completed = final_distances.len();
        BatchSummary {
            failed: outcomes.len() - completed,
            completed,
            final_distances,
            outcomes,
        }
    }

    /// Number of completed runs that ended within `tolerance` of the target.
    pub fn converged(&self, tolerance: f64) -> usize {
        self.final_distances
            .iter()
            .filter(|&&d| d < tolerance)
            .count()
    }

    pub fn worst_distance(&self) -> Option<f64> {
        self.final_distances.iter().copied().reduce(f64::max)
    }
}

/// Run `config` once per initial state, in parallel.
///
/// The configuration is validated before any run starts, so a bad
/// configuration fails the whole batch. Each worker synthesizes its own
/// controller.
pub fn run_batch(
    config: &SimulationConfig,
    initial_states: &[AcrobotState],
) -> Result<BatchSummary, ConfigError> {
    Simulation::from_config(config)?;

    let outcomes = initial_states
        .par_iter()
        .map(|&initial_state| -> Result<BatchOutcome, ConfigError> {
            let mut sim = Simulation::from_config(config)?.with_initial_state(initial_state);
            let result = sim
                .run()
                .map(|trajectory| trajectory.final_state().unwrap_or(initial_state))
                .map_err(|failure| failure.error);
            Ok(BatchOutcome {
                initial_state,
                result,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let summary = BatchSummary::from_outcomes(outcomes, &config.equilibrium);
    info!(
        "Batch finished: {} completed, {} failed",
        summary.completed, summary.failed
    );
    Ok(summary)
}

/// `count` states perturbed uniformly by up to `spread` in every coordinate.
///
/// The same seed always yields the same states.
pub fn perturbed_states(
    base: &AcrobotState,
    spread: f64,
    count: usize,
    seed: u64,
) -> Vec<AcrobotState> {
    let mut rng = StdRng::seed_from_u64(seed);
    let spread = spread.abs();
    (0..count)
        .map(|_| {
            let mut offset = || {
                if spread > 0.0 {
                    rng.gen_range(-spread..=spread)
                } else {
                    0.0
                }
            };
            AcrobotState::new(
                base.theta1 + offset(),
                base.theta2 + offset(),
                base.omega1 + offset(),
                base.omega2 + offset(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use control::ControllerConfig;

    #[test]
    fn test_perturbed_states_are_seeded_and_bounded() {
        let base = AcrobotState::upright();
        let a = perturbed_states(&base, 0.05, 16, 7);
        let b = perturbed_states(&base, 0.05, 16, 7);
        let c = perturbed_states(&base, 0.05, 16, 8);
        assert_eq!(a, b);
        assert_ne!(a, c);
        for s in &a {
            let e = s.to_vector() - base.to_vector();
            assert!(e.amax() <= 0.05 + 1e-15);
        }
    }

    #[test]
    fn test_zero_spread_returns_base() {
        let base = AcrobotState::new(0.1, 0.2, 0.3, 0.4);
        assert_eq!(perturbed_states(&base, 0.0, 3, 1), vec![base; 3]);
    }

    #[test]
    fn test_passive_batch_completes() {
        let config = SimulationConfig::default()
            .with_controller(ControllerConfig::Passive)
            .with_timing(0.01, 0.5);
        let starts = perturbed_states(&AcrobotState::hanging(), 0.2, 6, 3);
        let summary = run_batch(&config, &starts).unwrap();
        assert_eq!(summary.completed, 6);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.outcomes.len(), 6);
        for (outcome, start) in summary.outcomes.iter().zip(&starts) {
            assert_eq!(&outcome.initial_state, start);
        }
    }

    #[test]
    fn test_bad_configuration_fails_whole_batch() {
        let config = SimulationConfig::default().with_timing(-1.0, 1.0);
        assert!(run_batch(&config, &[AcrobotState::hanging()]).is_err());
    }

    #[test]
    fn test_non_finite_start_counts_as_failure() {
        let config = SimulationConfig::default()
            .with_controller(ControllerConfig::Passive)
            .with_timing(0.01, 0.1);
        let starts = [
            AcrobotState::hanging(),
            AcrobotState::new(f64::NAN, 0.0, 0.0, 0.0),
        ];
        let summary = run_batch(&config, &starts).unwrap();
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.failed, 1);
        assert!(summary.outcomes[1].result.is_err());
    }
}
