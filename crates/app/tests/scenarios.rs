use std::f64::consts::{FRAC_PI_2, PI};
use std::ops::ControlFlow;

use acrobot_sim::{
    ConfigError, RunStatus, Sample, Simulation, SimulationConfig, perturbed_states, run,
    run_batch,
};
use control::{
    AcrobotController, ControlError, ControlMode, ControllerConfig, CostWeights, EnergySwingUp,
    LqrConfig, LqrStabilizer, PdConfig, PdStabilizer, Stabilizer, StabilizerConfig,
    SwingUpConfig, SwitchPolicy, state_error, wrap_angle,
};
use mechanics::{Acrobot, AcrobotParams, DynamicsError};
use simcore::{AcrobotState, ExplicitEuler, IntegrationScheme, RungeKutta4};

fn swing_up_start() -> AcrobotState {
    AcrobotState::new(PI / 16.0, 0.0, 0.0, 0.0)
}

fn distance_to_upright(state: &AcrobotState) -> f64 {
    state_error(state, &AcrobotState::upright()).amax()
}

fn swing_up_lqr(plant: Acrobot, policy: SwitchPolicy) -> AcrobotController {
    let upright = AcrobotState::upright();
    let swing = EnergySwingUp::toward(&plant, &upright, 1.0).unwrap();
    let lqr = LqrStabilizer::design(&plant, &upright, &CostWeights::default()).unwrap();
    AcrobotController::swing_up_then_stabilize(plant, swing, Stabilizer::Lqr(lqr), policy).unwrap()
}

#[test]
fn test_swing_up_reaches_and_holds_upright() {
    let plant = Acrobot::new(AcrobotParams::default()).unwrap();
    let mut ctrl = swing_up_lqr(plant, SwitchPolicy::default());
    let traj = run(&plant, swing_up_start(), &mut ctrl, &RungeKutta4, 2000, 0.01).unwrap();

    assert_eq!(ctrl.mode(), ControlMode::Stabilize);
    let transitions = ctrl.transitions();
    assert_eq!(transitions.len(), 1);
    let switch_time = transitions[0].t;
    assert!(switch_time > 1.0 && switch_time < 5.0, "switched at {switch_time}");

    // Stays in the basin after the hand-over
    let max_deviation = traj
        .samples
        .iter()
        .filter(|s| s.t > switch_time)
        .map(|s| wrap_angle(s.state.theta1 - PI).abs())
        .fold(0.0, f64::max);
    assert!(max_deviation < 0.6, "max deviation {max_deviation}");

    let last = traj.final_state().unwrap();
    assert!(distance_to_upright(&last) < 1e-3, "final state {last:?}");
    assert!(traj.peak_torque() <= 15.0);
}

#[test]
fn test_swing_up_scenario_from_config() {
    let config = SimulationConfig::swing_up_scenario();
    let mut sim = Simulation::from_config(&config).unwrap();
    let traj = sim.run().unwrap();
    assert_eq!(traj.len(), config.num_steps() + 1);
    assert!(distance_to_upright(&traj.final_state().unwrap()) < 1e-3);

    // A second run after reset reproduces the first exactly
    let again = sim.run().unwrap();
    assert_eq!(again, traj);
}

#[test]
fn test_swing_up_with_pd_stabilizer() {
    let config = SimulationConfig::swing_up_scenario().with_controller(
        ControllerConfig::SwingUpThenStabilize {
            swing_up: SwingUpConfig::default(),
            stabilizer: StabilizerConfig::Pd(PdConfig::default()),
            switch: SwitchPolicy::default(),
        },
    );
    let traj = Simulation::from_config(&config).unwrap().run().unwrap();
    assert!(distance_to_upright(&traj.final_state().unwrap()) < 1e-3);
}

#[test]
fn test_swing_up_with_release_threshold() {
    let plant = Acrobot::new(AcrobotParams::default()).unwrap();
    let mut ctrl = swing_up_lqr(plant, SwitchPolicy::new(0.3).with_release(1.0));
    let traj = run(&plant, swing_up_start(), &mut ctrl, &RungeKutta4, 2000, 0.01).unwrap();
    assert_eq!(ctrl.mode(), ControlMode::Stabilize);
    assert!(distance_to_upright(&traj.final_state().unwrap()) < 1e-3);
}

#[test]
fn test_swing_up_with_euler_integration() {
    let config =
        SimulationConfig::swing_up_scenario().with_integrator(IntegrationScheme::Euler);
    let traj = Simulation::from_config(&config).unwrap().run().unwrap();
    assert!(distance_to_upright(&traj.final_state().unwrap()) < 1e-3);
}

#[test]
fn test_swing_up_robust_to_small_start_perturbations() {
    let config = SimulationConfig::swing_up_scenario();
    let starts = perturbed_states(&swing_up_start(), 0.02, 4, 11);
    let summary = run_batch(&config, &starts).unwrap();
    assert_eq!(summary.completed, 4);
    assert_eq!(summary.converged(1e-3), 4, "{:?}", summary.final_distances);
}

#[test]
fn test_lqr_balance_converges() {
    let config = SimulationConfig::lqr_balance_scenario();
    let traj = Simulation::from_config(&config).unwrap().run().unwrap();

    let at = |t: f64| {
        let sample = &traj.samples[(t / config.dt).round() as usize];
        distance_to_upright(&sample.state)
    };
    assert!(at(5.0) < at(0.0) / 10.0);
    assert!(at(10.0) < at(5.0));
    assert!(at(10.0) < 1e-6, "final distance {}", at(10.0));
    assert!(traj.peak_torque() <= config.params.torque_limit);
}

#[test]
fn test_lqr_balance_with_tight_torque_limit() {
    for (limit, integrator) in [
        (1.0, IntegrationScheme::Rk4),
        (1.0, IntegrationScheme::Euler),
        (5.0, IntegrationScheme::Euler),
    ] {
        let config = SimulationConfig::lqr_balance_scenario()
            .with_params(AcrobotParams::default().with_torque_limit(limit))
            .with_integrator(integrator);
        let traj = Simulation::from_config(&config).unwrap().run().unwrap();
        assert!(traj.peak_torque() <= limit);
        assert!(
            distance_to_upright(&traj.final_state().unwrap()) < 1e-6,
            "limit {limit}, {integrator:?}"
        );
    }
}

#[test]
fn test_lqr_batch_around_upright() {
    let config = SimulationConfig::lqr_balance_scenario();
    let starts = perturbed_states(&AcrobotState::upright(), 0.02, 8, 2024);
    let summary = run_batch(&config, &starts).unwrap();
    assert_eq!(summary.failed, 0);
    let worst = summary.worst_distance().unwrap();
    assert!(worst < 1e-5, "worst final distance {worst}");
}

#[test]
fn test_saturation_holds_far_from_linear_regime() {
    let params = AcrobotParams::default().with_torque_limit(2.0);
    let config = SimulationConfig::lqr_balance_scenario()
        .with_params(params)
        .with_initial_state(AcrobotState::new(PI + 0.4, -0.3, 1.0, -1.0))
        .with_timing(0.01, 5.0);
    let traj = Simulation::from_config(&config).unwrap().run().unwrap();
    assert!(traj.samples.iter().all(|s| s.torque.abs() <= 2.0));
}

#[test]
fn test_passive_energy_drift_by_integrator() {
    let params = AcrobotParams::default();
    let plant = Acrobot::new(params).unwrap();
    let start = AcrobotState::new(FRAC_PI_2, 0.3, 0.0, 0.0);
    let drift = |integrator: IntegrationScheme, substeps: u32| {
        let config = SimulationConfig::default()
            .with_controller(ControllerConfig::Passive)
            .with_initial_state(start)
            .with_integrator(integrator)
            .with_substeps(substeps)
            .with_timing(0.01, 5.0);
        let traj = Simulation::from_config(&config).unwrap().run().unwrap();
        let e0 = plant.total_energy(&start);
        traj.states()
            .map(|s| (plant.total_energy(s) - e0).abs())
            .fold(0.0, f64::max)
    };

    let rk4 = drift(IntegrationScheme::Rk4, 1);
    let euler = drift(IntegrationScheme::Euler, 1);
    let euler_fine = drift(IntegrationScheme::Euler, 10);
    assert!(rk4 < 1e-6, "rk4 drift {rk4}");
    assert!(euler > 0.1, "euler drift {euler}");
    assert!(euler_fine < euler / 5.0, "euler {euler}, substepped {euler_fine}");
}

#[test]
fn test_euler_and_rk4_agree_for_short_horizon() {
    let plant = Acrobot::new(AcrobotParams::default()).unwrap();
    let start = AcrobotState::new(0.4, 0.2, 0.0, 0.0);
    let mut passive = control::OpenLoop::passive();
    let rk4 = run(&plant, start, &mut passive, &RungeKutta4, 100, 0.001).unwrap();
    let euler = run(&plant, start, &mut passive, &ExplicitEuler, 100, 0.001).unwrap();
    let gap = (rk4.final_state().unwrap().to_vector() - euler.final_state().unwrap().to_vector())
        .amax();
    assert!(gap < 1e-3, "gap {gap}");
}

#[test]
fn test_cancel_once_balanced() {
    let mut sim = Simulation::from_config(&SimulationConfig::swing_up_scenario()).unwrap();
    let mut last = None;
    let mut sink = |sample: &Sample| {
        last = Some(*sample);
        if distance_to_upright(&sample.state) < 1e-2 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    };
    let status = sim.run_with_sink(&mut sink).unwrap();
    let last = last.unwrap();
    assert_eq!(status, RunStatus::Cancelled { at_step: last.step });
    assert!(last.t < 20.0);
    assert!(distance_to_upright(&last.state) < 1e-2);
}

#[test]
fn test_configuration_errors_surface_before_running() {
    let bad_weights = SimulationConfig::lqr_balance_scenario().with_controller(
        ControllerConfig::Lqr(LqrConfig {
            weights: CostWeights::new([10.0, 10.0, 1.0, 1.0], 0.0),
        }),
    );
    assert!(matches!(
        Simulation::from_config(&bad_weights),
        Err(ConfigError::Controller(ControlError::InvalidCostWeights(_)))
    ));

    let mut tilted = SimulationConfig::lqr_balance_scenario();
    tilted.equilibrium = AcrobotState::new(PI / 3.0, 0.0, 0.0, 0.0);
    assert!(matches!(
        Simulation::from_config(&tilted),
        Err(ConfigError::Controller(ControlError::Dynamics(
            DynamicsError::NotAnEquilibrium { .. }
        )))
    ));

    let heavy_coupling = SimulationConfig::default()
        .with_params(AcrobotParams::default().with_inertias(0.01, 0.01));
    assert!(matches!(
        Simulation::from_config(&heavy_coupling),
        Err(ConfigError::Parameters(_))
    ));
}

#[test]
fn test_pd_only_balances_small_offset() {
    let plant = Acrobot::new(AcrobotParams::default()).unwrap();
    let mut ctrl = AcrobotController::stabilizing(plant, Stabilizer::Pd(PdStabilizer::default()));
    let start = AcrobotState::new(PI + 0.05, 0.0, 0.0, 0.0);
    let traj = run(&plant, start, &mut ctrl, &RungeKutta4, 2000, 0.01).unwrap();
    assert!(distance_to_upright(&traj.final_state().unwrap()) < 1e-6);
}
