//! Grid store: the single source of truth for every garden entity.
//!
//! The engine only talks to [`GridStore`]; [`HecsGridStore`] is the
//! in-memory implementation used by the application. Reads hand out owned
//! copies, writes go through the `save_*`/`insert_*`/`delete_*` calls, so a
//! phase sees its own writes and everything earlier phases stored.

mod hecs_store;
#[cfg(test)]
pub(crate) mod testing;

pub use hecs_store::HecsGridStore;

use serde::{Deserialize, Serialize};

use crate::components::*;
use crate::error::{EntityKind, Result, SimulationError};

/// Every entity in the store, used for export and restore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreContents {
    pub next_id: u64,
    pub plots: Vec<Plot>,
    pub plants: Vec<Plant>,
    pub insects: Vec<Insect>,
    pub devices: Vec<Device>,
    pub programs: Vec<Program>,
}

pub trait GridStore: Send + Sync {
    // ------------------------------------------------------------------
    // Plots
    // ------------------------------------------------------------------

    fn find_all_plots(&self) -> Vec<Plot>;
    fn find_plot(&self, id: PlotId) -> Option<Plot>;
    fn find_plot_by_coords(&self, x: i32, y: i32) -> Option<Plot>;
    /// Plots with `(px - x)² + (py - y)² <= radius²`, centre included.
    fn find_plots_within_radius(&self, x: i32, y: i32, radius: u32) -> Vec<Plot>;
    /// The 8-connected neighbours of `(x, y)`, never the cell itself.
    fn find_neighbor_plots(&self, x: i32, y: i32) -> Vec<Plot>;
    /// Fails with `InvalidState` when the coordinates are already taken.
    fn insert_plot(&mut self, x: i32, y: i32, moisture: f64) -> Result<Plot>;
    fn save_all_plots(&mut self, plots: &[Plot]) -> Result<()>;
    /// Cascades to the plot's plants, insects, device and programs.
    fn delete_plot(&mut self, id: PlotId) -> Result<()>;

    // ------------------------------------------------------------------
    // Plants
    // ------------------------------------------------------------------

    fn find_all_plants(&self) -> Vec<Plant>;
    fn find_plant(&self, id: PlantId) -> Option<Plant>;
    fn find_plants_by_plot(&self, plot: PlotId) -> Vec<Plant>;
    fn insert_plants(&mut self, plants: Vec<NewPlant>) -> Result<Vec<Plant>>;
    fn save_all_plants(&mut self, plants: &[Plant]) -> Result<()>;
    fn delete_all_plants(&mut self, ids: &[PlantId]) -> Result<()>;

    // ------------------------------------------------------------------
    // Insects
    // ------------------------------------------------------------------

    fn find_all_insects(&self) -> Vec<Insect>;
    fn find_insect(&self, id: InsectId) -> Option<Insect>;
    fn find_insects_by_plot(&self, plot: PlotId) -> Vec<Insect>;
    /// Candidate mates: same plot and species, any sex other than `sex`.
    fn find_insects_by_plot_species_not_sex(
        &self,
        plot: PlotId,
        species: &str,
        sex: Sex,
    ) -> Vec<Insect>;
    fn insert_insects(&mut self, insects: Vec<NewInsect>) -> Result<Vec<Insect>>;
    fn save_all_insects(&mut self, insects: &[Insect]) -> Result<()>;
    fn delete_all_insects(&mut self, ids: &[InsectId]) -> Result<()>;

    // ------------------------------------------------------------------
    // Devices and programs
    // ------------------------------------------------------------------

    fn find_all_devices(&self) -> Vec<Device>;
    fn find_device(&self, id: DeviceId) -> Option<Device>;
    fn find_device_by_plot(&self, plot: PlotId) -> Option<Device>;
    /// Fails with `InvalidState` when the plot already carries a device.
    fn insert_device(&mut self, plot: PlotId, radius: u32) -> Result<Device>;
    fn save_device(&mut self, device: &Device) -> Result<()>;
    /// Cascades to the device's programs.
    fn delete_device(&mut self, id: DeviceId) -> Result<()>;

    fn find_all_programs(&self) -> Vec<Program>;
    fn find_program(&self, id: ProgramId) -> Option<Program>;
    fn find_programs_by_device(&self, device: DeviceId) -> Vec<Program>;
    fn insert_program(&mut self, program: NewProgram) -> Result<Program>;
    fn save_program(&mut self, program: &Program) -> Result<()>;
    fn delete_program(&mut self, id: ProgramId) -> Result<()>;

    // ------------------------------------------------------------------
    // Bulk
    // ------------------------------------------------------------------

    /// Removes plants, insects, devices and programs; plots stay untouched.
    fn clear_dependents(&mut self);
    fn clear(&mut self);
    fn contents(&self) -> StoreContents;
    /// Replaces everything with `contents`, keeping the stored ids. On error
    /// the store is left exactly as it was.
    fn restore(&mut self, contents: StoreContents) -> Result<()>;

    // ------------------------------------------------------------------
    // Lookups that must succeed
    // ------------------------------------------------------------------

    fn plot(&self, id: PlotId) -> Result<Plot> {
        self.find_plot(id)
            .ok_or_else(|| SimulationError::not_found(EntityKind::Plot, id))
    }

    fn plot_at(&self, x: i32, y: i32) -> Result<Plot> {
        self.find_plot_by_coords(x, y)
            .ok_or_else(|| SimulationError::not_found(EntityKind::Plot, format!("({x},{y})")))
    }

    fn plant(&self, id: PlantId) -> Result<Plant> {
        self.find_plant(id)
            .ok_or_else(|| SimulationError::not_found(EntityKind::Plant, id))
    }

    fn insect(&self, id: InsectId) -> Result<Insect> {
        self.find_insect(id)
            .ok_or_else(|| SimulationError::not_found(EntityKind::Insect, id))
    }

    fn device(&self, id: DeviceId) -> Result<Device> {
        self.find_device(id)
            .ok_or_else(|| SimulationError::not_found(EntityKind::Device, id))
    }

    fn program(&self, id: ProgramId) -> Result<Program> {
        self.find_program(id)
            .ok_or_else(|| SimulationError::not_found(EntityKind::Program, id))
    }
}
