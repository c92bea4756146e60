use std::env;
use std::error::Error;
use std::io;

use acrobot_sim::{Simulation, SimulationConfig};
use log::{LevelFilter, info};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

const USAGE: &str = "usage: acrobot-sim [config.json] [--csv]";

fn log_level() -> LevelFilter {
    env::var("ACROBOT_LOG")
        .ok()
        .and_then(|level| level.parse().ok())
        .unwrap_or(LevelFilter::Info)
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut config_path = None;
    let mut csv = false;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--csv" => csv = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                return Ok(());
            }
            _ if config_path.is_none() => config_path = Some(arg),
            _ => return Err(USAGE.into()),
        }
    }

    TermLogger::init(
        log_level(),
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    let config = match &config_path {
        Some(path) => SimulationConfig::from_path(path)?,
        None => {
            info!("No configuration given, running the swing-up scenario");
            SimulationConfig::swing_up_scenario()
        }
    };

    let mut sim = Simulation::from_config(&config)?;
    let trajectory = sim.run()?;
    info!(
        "Recorded {} samples, peak torque {:.3} N·m",
        trajectory.len(),
        trajectory.peak_torque()
    );

    if csv {
        trajectory.write_csv(io::stdout().lock())?;
    }
    Ok(())
}
