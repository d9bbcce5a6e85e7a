//! Store wrapper that can be told to fail insect writes, for exercising the
//! tick error paths.

use std::sync::{Arc, Mutex};

use super::{GridStore, HecsGridStore, StoreContents};
use crate::components::*;
use crate::error::{Result, SimulationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fault {
    Error,
    Panic,
}

/// Shared handle that arms or disarms the fault of a [`FlakyStore`].
#[derive(Clone, Default)]
pub(crate) struct FaultSwitch(Arc<Mutex<Option<Fault>>>);

impl FaultSwitch {
    pub(crate) fn set(&self, fault: Option<Fault>) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = fault;
    }

    fn get(&self) -> Option<Fault> {
        *self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Delegates everything to a [`HecsGridStore`] except `save_all_insects`,
/// which errors or panics while the switch is armed.
pub(crate) struct FlakyStore {
    inner: HecsGridStore,
    switch: FaultSwitch,
}

impl FlakyStore {
    pub(crate) fn new(inner: HecsGridStore) -> (Self, FaultSwitch) {
        let switch = FaultSwitch::default();
        (
            Self {
                inner,
                switch: switch.clone(),
            },
            switch,
        )
    }
}

impl GridStore for FlakyStore {
    fn find_all_plots(&self) -> Vec<Plot> {
        self.inner.find_all_plots()
    }
    fn find_plot(&self, id: PlotId) -> Option<Plot> {
        self.inner.find_plot(id)
    }
    fn find_plot_by_coords(&self, x: i32, y: i32) -> Option<Plot> {
        self.inner.find_plot_by_coords(x, y)
    }
    fn find_plots_within_radius(&self, x: i32, y: i32, radius: u32) -> Vec<Plot> {
        self.inner.find_plots_within_radius(x, y, radius)
    }
    fn find_neighbor_plots(&self, x: i32, y: i32) -> Vec<Plot> {
        self.inner.find_neighbor_plots(x, y)
    }
    fn insert_plot(&mut self, x: i32, y: i32, moisture: f64) -> Result<Plot> {
        self.inner.insert_plot(x, y, moisture)
    }
    fn save_all_plots(&mut self, plots: &[Plot]) -> Result<()> {
        self.inner.save_all_plots(plots)
    }
    fn delete_plot(&mut self, id: PlotId) -> Result<()> {
        self.inner.delete_plot(id)
    }

    fn find_all_plants(&self) -> Vec<Plant> {
        self.inner.find_all_plants()
    }
    fn find_plant(&self, id: PlantId) -> Option<Plant> {
        self.inner.find_plant(id)
    }
    fn find_plants_by_plot(&self, plot: PlotId) -> Vec<Plant> {
        self.inner.find_plants_by_plot(plot)
    }
    fn insert_plants(&mut self, plants: Vec<NewPlant>) -> Result<Vec<Plant>> {
        self.inner.insert_plants(plants)
    }
    fn save_all_plants(&mut self, plants: &[Plant]) -> Result<()> {
        self.inner.save_all_plants(plants)
    }
    fn delete_all_plants(&mut self, ids: &[PlantId]) -> Result<()> {
        self.inner.delete_all_plants(ids)
    }

    fn find_all_insects(&self) -> Vec<Insect> {
        self.inner.find_all_insects()
    }
    fn find_insect(&self, id: InsectId) -> Option<Insect> {
        self.inner.find_insect(id)
    }
    fn find_insects_by_plot(&self, plot: PlotId) -> Vec<Insect> {
        self.inner.find_insects_by_plot(plot)
    }
    fn find_insects_by_plot_species_not_sex(
        &self,
        plot: PlotId,
        species: &str,
        sex: Sex,
    ) -> Vec<Insect> {
        self.inner.find_insects_by_plot_species_not_sex(plot, species, sex)
    }
    fn insert_insects(&mut self, insects: Vec<NewInsect>) -> Result<Vec<Insect>> {
        self.inner.insert_insects(insects)
    }
    fn save_all_insects(&mut self, insects: &[Insect]) -> Result<()> {
        match self.switch.get() {
            Some(Fault::Error) => Err(SimulationError::InvalidState("insect writes disabled".into())),
            Some(Fault::Panic) => panic!("insect writes disabled"),
            None => self.inner.save_all_insects(insects),
        }
    }
    fn delete_all_insects(&mut self, ids: &[InsectId]) -> Result<()> {
        self.inner.delete_all_insects(ids)
    }

    fn find_all_devices(&self) -> Vec<Device> {
        self.inner.find_all_devices()
    }
    fn find_device(&self, id: DeviceId) -> Option<Device> {
        self.inner.find_device(id)
    }
    fn find_device_by_plot(&self, plot: PlotId) -> Option<Device> {
        self.inner.find_device_by_plot(plot)
    }
    fn insert_device(&mut self, plot: PlotId, radius: u32) -> Result<Device> {
        self.inner.insert_device(plot, radius)
    }
    fn save_device(&mut self, device: &Device) -> Result<()> {
        self.inner.save_device(device)
    }
    fn delete_device(&mut self, id: DeviceId) -> Result<()> {
        self.inner.delete_device(id)
    }

    fn find_all_programs(&self) -> Vec<Program> {
        self.inner.find_all_programs()
    }
    fn find_program(&self, id: ProgramId) -> Option<Program> {
        self.inner.find_program(id)
    }
    fn find_programs_by_device(&self, device: DeviceId) -> Vec<Program> {
        self.inner.find_programs_by_device(device)
    }
    fn insert_program(&mut self, program: NewProgram) -> Result<Program> {
        self.inner.insert_program(program)
    }
    fn save_program(&mut self, program: &Program) -> Result<()> {
        self.inner.save_program(program)
    }
    fn delete_program(&mut self, id: ProgramId) -> Result<()> {
        self.inner.delete_program(id)
    }

    fn clear_dependents(&mut self) {
        self.inner.clear_dependents()
    }
    fn clear(&mut self) {
        self.inner.clear()
    }
    fn contents(&self) -> StoreContents {
        self.inner.contents()
    }
    fn restore(&mut self, contents: StoreContents) -> Result<()> {
        self.inner.restore(contents)
    }
}
