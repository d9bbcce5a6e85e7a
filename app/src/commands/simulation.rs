use std::path::Path;

use simulation::{
    garden::GardenSummary, ImportResult, LoadFileResult, Result, SaveStats, SimulationError,
    TickReport, WorldStateSnapshot,
};
use tracing::info;

use crate::state::{AppState, SimulationStatus};

/// Start the timer at `speed` ticks per second (the configured default when
/// absent). Starting a running simulation changes nothing.
pub fn start(state: &AppState, speed: Option<u32>) -> Result<SimulationStatus> {
    let runner = &state.config.runner;
    let speed = speed.unwrap_or(runner.default_speed);
    if speed > runner.max_speed {
        return Err(SimulationError::Validation(format!(
            "speed {speed} exceeds the maximum of {}",
            runner.max_speed
        )));
    }
    state.clock.start_with_speed(speed)?;
    Ok(SimulationStatus::of(&state.clock))
}

pub fn stop(state: &AppState) -> SimulationStatus {
    state.clock.stop();
    SimulationStatus::of(&state.clock)
}

pub fn status(state: &AppState) -> SimulationStatus {
    SimulationStatus::of(&state.clock)
}

pub fn get_state(state: &AppState) -> WorldStateSnapshot {
    state.clock.world().snapshot()
}

pub fn step(state: &AppState) -> Result<TickReport> {
    state.clock.step()
}

/// Stop, zero the tick counter and clear everything but the plots.
pub fn reset(state: &AppState) -> SimulationStatus {
    state.clock.reset();
    SimulationStatus::of(&state.clock)
}

/// Replace the garden with the configured default layout.
pub fn initialize(state: &AppState) -> Result<GardenSummary> {
    state.clock.reset_counter();
    let mut world = state.clock.world();
    world.initialize_garden(&state.config.garden)
}

pub fn save_world(state: &AppState, path: impl AsRef<Path>) -> Result<SaveStats> {
    state.clock.world().save_to_file(path)
}

pub fn load_world(state: &AppState, path: impl AsRef<Path>) -> Result<LoadFileResult> {
    state.clock.stop();
    let result = state.clock.world().load_from_file(path)?;
    info!(tick = result.imported.tick, plots = result.imported.plots, "garden restored");
    Ok(result)
}

pub fn export_world(state: &AppState) -> Result<String> {
    state.clock.world().export_world()
}

pub fn import_world(state: &AppState, json: &str) -> Result<ImportResult> {
    state.clock.stop();
    state.clock.world().import_world(json)
}
