//! Potager command-line controller
//!
//! Builds the default garden (or loads a saved one), drives the simulation
//! headless or on its timer, and prints or saves the result.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use potager_app::{commands, AppState};
use simulation::SimulationConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "potager=info,simulation=info";

#[derive(Parser, Debug)]
#[command(name = "potager")]
#[command(about = "Grid garden simulation: plots, plants, insects and treatment devices")]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for deterministic runs (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Ticks to run synchronously, one after the other
    #[arg(long, default_value_t = 0)]
    ticks: u32,

    /// Timer speed in ticks per second, used with --run-for-ms
    #[arg(long)]
    speed: Option<u32>,

    /// Run the timer for this many milliseconds
    #[arg(long, default_value_t = 0)]
    run_for_ms: u64,

    /// Print the final garden state as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Save the final garden to this file
    #[arg(long)]
    save: Option<PathBuf>,

    /// Start from a previously saved garden instead of the default one
    #[arg(long)]
    load: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "simulation=trace" (defaults to RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

fn init_tracing(level: Option<&str>) -> anyhow::Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).context("invalid --log-level")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref())?;

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    let seed = args.seed.or(config.seed).unwrap_or_else(rand::random);
    config.seed = Some(seed);
    info!(seed, "potager starting");

    let state = AppState::new(config);
    match &args.load {
        Some(path) => {
            commands::simulation::load_world(&state, path)
                .with_context(|| format!("loading garden from {}", path.display()))?;
        }
        None => {
            commands::simulation::initialize(&state)?;
        }
    }

    for _ in 0..args.ticks {
        commands::simulation::step(&state)?;
    }

    if args.run_for_ms > 0 {
        let status = commands::simulation::start(&state, args.speed)?;
        info!(period_ms = ?status.period_ms, "running for {} ms", args.run_for_ms);
        thread::sleep(Duration::from_millis(args.run_for_ms));
        commands::simulation::stop(&state);
    }

    let snapshot = commands::simulation::get_state(&state);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        info!(
            tick = snapshot.tick,
            plots = snapshot.plots.len(),
            plants = snapshot.plant_count(),
            insects = snapshot.insect_count(),
            devices = snapshot.device_count(),
            "final garden"
        );
    }

    if let Some(path) = &args.save {
        let stats = commands::simulation::save_world(&state, path)
            .with_context(|| format!("saving garden to {}", path.display()))?;
        info!(bytes = stats.bytes, entities = stats.entities, "saved to {}", path.display());
    }

    Ok(())
}
