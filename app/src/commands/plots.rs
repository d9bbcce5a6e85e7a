use std::collections::HashSet;

use simulation::{Plot, PlotId, Result, DEFAULT_MOISTURE};

use crate::state::AppState;

pub fn list_plots(state: &AppState) -> Vec<Plot> {
    state.clock.world().store().find_all_plots()
}

pub fn get_plot(state: &AppState, id: PlotId) -> Result<Plot> {
    state.clock.world().store().plot(id)
}

pub fn get_plot_at(state: &AppState, x: i32, y: i32) -> Result<Plot> {
    state.clock.world().store().plot_at(x, y)
}

pub fn create_plot(state: &AppState, x: i32, y: i32, moisture: Option<f64>) -> Result<Plot> {
    state
        .clock
        .world()
        .store_mut()
        .insert_plot(x, y, moisture.unwrap_or(DEFAULT_MOISTURE))
}

/// The up to eight plots touching `id`, diagonals included.
pub fn neighbors(state: &AppState, id: PlotId) -> Result<Vec<Plot>> {
    let world = state.clock.world();
    let plot = world.store().plot(id)?;
    Ok(world.store().find_neighbor_plots(plot.x, plot.y))
}

/// Set the moisture level, clamped to [0, 100].
pub fn update_moisture(state: &AppState, id: PlotId, moisture: f64) -> Result<Plot> {
    let mut world = state.clock.world();
    let store = world.store_mut();
    let mut plot = store.plot(id)?;
    plot.set_moisture(moisture);
    store.save_all_plots(std::slice::from_ref(&plot))?;
    Ok(plot)
}

/// Deletes the plot with everything on it.
pub fn delete_plot(state: &AppState, id: PlotId) -> Result<()> {
    state.clock.world().store_mut().delete_plot(id)
}

pub fn plots_with_plants(state: &AppState) -> Vec<Plot> {
    let world = state.clock.world();
    let store = world.store();
    let occupied: HashSet<PlotId> = store.find_all_plants().iter().map(|p| p.plot).collect();
    store
        .find_all_plots()
        .into_iter()
        .filter(|p| occupied.contains(&p.id))
        .collect()
}

pub fn plots_with_insects(state: &AppState) -> Vec<Plot> {
    let world = state.clock.world();
    let store = world.store();
    let occupied: HashSet<PlotId> = store.find_all_insects().iter().map(|i| i.plot).collect();
    store
        .find_all_plots()
        .into_iter()
        .filter(|p| occupied.contains(&p.id))
        .collect()
}

pub fn plots_with_device(state: &AppState) -> Vec<Plot> {
    let world = state.clock.world();
    let store = world.store();
    store
        .find_all_plots()
        .into_iter()
        .filter(|p| store.find_device_by_plot(p.id).is_some())
        .collect()
}
