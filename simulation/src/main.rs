//! Potager Simulation Benchmark
//!
//! Standalone benchmark for the simulation engine.

use simulation::{GardenConfig, SimulationConfig, SimulationWorld};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const BENCH_TICKS: u32 = 30;

fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Potager simulation engine starting...");

    let config = SimulationConfig {
        seed: Some(42),
        garden: GardenConfig {
            width: 40,
            height: 40,
            starter_plants: 200,
            starter_insects: 300,
            ..GardenConfig::default()
        },
        ..SimulationConfig::default()
    };
    config.validate()?;

    let mut world = SimulationWorld::from_config(&config);
    let summary = world.initialize_garden(&config.garden)?;
    info!(
        "Garden seeded: {} plots, {} plants, {} insects",
        summary.plots, summary.plants, summary.insects
    );

    info!("Running {} tick benchmark...", BENCH_TICKS);
    let start = std::time::Instant::now();
    for _ in 0..BENCH_TICKS {
        world.execute_tick()?;
    }
    let elapsed = start.elapsed();

    let snapshot = world.snapshot();
    info!(
        "Benchmark complete: {:?} total, {:?} per tick, {} plants, {} insects",
        elapsed,
        elapsed / BENCH_TICKS,
        snapshot.plant_count(),
        snapshot.insect_count()
    );

    Ok(())
}
