//! In-memory grid store backed by a `hecs` world.
//!
//! Each plot, plant, insect, device and program is one entity carrying its
//! struct as the only component. Id, coordinate and per-plot indexes sit
//! beside the world so point lookups and per-plot reads do not scan.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Display;
use std::hash::Hash;

use hecs::{Component, Entity, World};

use super::{GridStore, StoreContents};
use crate::components::*;
use crate::error::{EntityKind, Result, SimulationError};

/// Component types kept in the store, ordered by their numeric id.
trait Stored: Component + Clone {
    fn key(&self) -> u64;
}

impl Stored for Plot {
    fn key(&self) -> u64 {
        self.id.0
    }
}

impl Stored for Plant {
    fn key(&self) -> u64 {
        self.id.0
    }
}

impl Stored for Insect {
    fn key(&self) -> u64 {
        self.id.0
    }
}

impl Stored for Device {
    fn key(&self) -> u64 {
        self.id.0
    }
}

impl Stored for Program {
    fn key(&self) -> u64 {
        self.id.0
    }
}

pub struct HecsGridStore {
    world: World,
    next_id: u64,
    plots: HashMap<PlotId, Entity>,
    plot_coords: HashMap<(i32, i32), PlotId>,
    plants: HashMap<PlantId, Entity>,
    insects: HashMap<InsectId, Entity>,
    devices: HashMap<DeviceId, Entity>,
    programs: HashMap<ProgramId, Entity>,
    plot_plants: HashMap<PlotId, BTreeSet<PlantId>>,
    plot_device: HashMap<PlotId, DeviceId>,
}

impl HecsGridStore {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            next_id: 1,
            plots: HashMap::new(),
            plot_coords: HashMap::new(),
            plants: HashMap::new(),
            insects: HashMap::new(),
            devices: HashMap::new(),
            programs: HashMap::new(),
            plot_plants: HashMap::new(),
            plot_device: HashMap::new(),
        }
    }

    /// Build a store holding exactly `contents`.
    ///
    /// Ids must be unique per kind, coordinates unique, every reference must
    /// resolve and a plot carries at most one device. Nothing is kept when
    /// any of that fails.
    pub fn from_contents(contents: StoreContents) -> Result<Self> {
        ensure_unique(EntityKind::Plot, contents.plots.iter().map(|p| p.id))?;
        ensure_unique(EntityKind::Plant, contents.plants.iter().map(|p| p.id))?;
        ensure_unique(EntityKind::Insect, contents.insects.iter().map(|i| i.id))?;
        ensure_unique(EntityKind::Device, contents.devices.iter().map(|d| d.id))?;
        ensure_unique(EntityKind::Program, contents.programs.iter().map(|p| p.id))?;

        let highest = contents
            .plots
            .iter()
            .map(|p| p.id.0)
            .chain(contents.plants.iter().map(|p| p.id.0))
            .chain(contents.insects.iter().map(|i| i.id.0))
            .chain(contents.devices.iter().map(|d| d.id.0))
            .chain(contents.programs.iter().map(|p| p.id.0))
            .max()
            .unwrap_or(0);

        let mut store = Self::new();
        store.next_id = contents.next_id.max(highest + 1);

        for plot in contents.plots {
            if store.plot_coords.contains_key(&(plot.x, plot.y)) {
                return Err(SimulationError::Validation(format!(
                    "duplicate plot coordinates ({},{})",
                    plot.x, plot.y
                )));
            }
            store.plot_coords.insert((plot.x, plot.y), plot.id);
            let entity = store.world.spawn((plot.clone(),));
            store.plots.insert(plot.id, entity);
        }
        for plant in contents.plants {
            store.require_plot(plant.plot)?;
            store.index_plant(plant.plot, plant.id);
            let entity = store.world.spawn((plant.clone(),));
            store.plants.insert(plant.id, entity);
        }
        for insect in contents.insects {
            store.require_plot(insect.plot)?;
            let entity = store.world.spawn((insect.clone(),));
            store.insects.insert(insect.id, entity);
        }
        for device in contents.devices {
            store.require_plot(device.plot)?;
            if let Some(existing) = store.plot_device.insert(device.plot, device.id) {
                return Err(SimulationError::Validation(format!(
                    "plot {} carries both device {existing} and device {}",
                    device.plot, device.id
                )));
            }
            let entity = store.world.spawn((device.clone(),));
            store.devices.insert(device.id, entity);
        }
        for program in contents.programs {
            if !store.devices.contains_key(&program.device) {
                return Err(SimulationError::not_found(EntityKind::Device, program.device));
            }
            let entity = store.world.spawn((program.clone(),));
            store.programs.insert(program.id, entity);
        }
        Ok(store)
    }

    /// Total number of stored entities of every kind.
    pub fn entity_count(&self) -> usize {
        self.world.len() as usize
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn read<T: Stored>(&self, entity: Option<&Entity>) -> Option<T> {
        let entity = *entity?;
        self.world.get::<&T>(entity).ok().map(|c| (*c).clone())
    }

    fn write<T: Stored>(&self, entity: Entity, value: T) {
        if let Ok(mut slot) = self.world.get::<&mut T>(entity) {
            *slot = value;
        }
    }

    fn collect_where<T: Stored>(&self, keep: impl Fn(&T) -> bool) -> Vec<T> {
        let mut found: Vec<T> = self
            .world
            .query::<&T>()
            .iter()
            .filter(|(_, c)| keep(*c))
            .map(|(_, c)| c.clone())
            .collect();
        found.sort_by_key(|c| c.key());
        found
    }

    fn require_plot(&self, id: PlotId) -> Result<()> {
        if self.plots.contains_key(&id) {
            Ok(())
        } else {
            Err(SimulationError::not_found(EntityKind::Plot, id))
        }
    }

    fn despawn_indexed<K: Eq + Hash>(world: &mut World, index: &mut HashMap<K, Entity>, key: &K) {
        if let Some(entity) = index.remove(key) {
            let _ = world.despawn(entity);
        }
    }

    fn index_plant(&mut self, plot: PlotId, plant: PlantId) {
        self.plot_plants.entry(plot).or_default().insert(plant);
    }

    fn unindex_plant(&mut self, plot: PlotId, plant: PlantId) {
        if let Some(ids) = self.plot_plants.get_mut(&plot) {
            ids.remove(&plant);
            if ids.is_empty() {
                self.plot_plants.remove(&plot);
            }
        }
    }

    fn remove_programs_of(&mut self, device: DeviceId) {
        let doomed: Vec<ProgramId> = self
            .collect_where::<Program>(|p| p.device == device)
            .into_iter()
            .map(|p| p.id)
            .collect();
        for id in doomed {
            Self::despawn_indexed(&mut self.world, &mut self.programs, &id);
        }
    }
}

fn ensure_unique<K: Copy + Eq + Hash + Display>(
    kind: EntityKind,
    ids: impl Iterator<Item = K>,
) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(SimulationError::Validation(format!("duplicate {kind} id {id}")));
        }
    }
    Ok(())
}

impl Default for HecsGridStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GridStore for HecsGridStore {
    fn find_all_plots(&self) -> Vec<Plot> {
        self.collect_where::<Plot>(|_| true)
    }

    fn find_plot(&self, id: PlotId) -> Option<Plot> {
        self.read(self.plots.get(&id))
    }

    fn find_plot_by_coords(&self, x: i32, y: i32) -> Option<Plot> {
        let id = self.plot_coords.get(&(x, y))?;
        self.find_plot(*id)
    }

    fn find_plots_within_radius(&self, x: i32, y: i32, radius: u32) -> Vec<Plot> {
        let r = i64::from(radius);
        self.collect_where::<Plot>(|p| p.distance_sq(x, y) <= r * r)
    }

    fn find_neighbor_plots(&self, x: i32, y: i32) -> Vec<Plot> {
        self.collect_where::<Plot>(|p| p.is_adjacent_to(x, y))
    }

    fn insert_plot(&mut self, x: i32, y: i32, moisture: f64) -> Result<Plot> {
        if self.plot_coords.contains_key(&(x, y)) {
            return Err(SimulationError::InvalidState(format!(
                "a plot already exists at ({x},{y})"
            )));
        }
        let plot = Plot {
            id: PlotId(self.allocate_id()),
            x,
            y,
            moisture: clamp_moisture(moisture),
        };
        let entity = self.world.spawn((plot.clone(),));
        self.plots.insert(plot.id, entity);
        self.plot_coords.insert((x, y), plot.id);
        Ok(plot)
    }

    fn save_all_plots(&mut self, plots: &[Plot]) -> Result<()> {
        for plot in plots {
            let stored = self
                .find_plot(plot.id)
                .ok_or_else(|| SimulationError::not_found(EntityKind::Plot, plot.id))?;
            if (stored.x, stored.y) != (plot.x, plot.y) {
                return Err(SimulationError::InvalidState(format!(
                    "plot {} cannot move from ({},{}) to ({},{})",
                    plot.id, stored.x, stored.y, plot.x, plot.y
                )));
            }
        }
        for plot in plots {
            let mut plot = plot.clone();
            plot.moisture = clamp_moisture(plot.moisture);
            self.write(self.plots[&plot.id], plot);
        }
        Ok(())
    }

    fn delete_plot(&mut self, id: PlotId) -> Result<()> {
        let plot = self.plot(id)?;
        let plants: Vec<PlantId> = self.find_plants_by_plot(id).iter().map(|p| p.id).collect();
        let insects: Vec<InsectId> = self.find_insects_by_plot(id).iter().map(|i| i.id).collect();
        self.delete_all_plants(&plants)?;
        self.delete_all_insects(&insects)?;
        if let Some(device) = self.find_device_by_plot(id) {
            self.delete_device(device.id)?;
        }
        self.plot_coords.remove(&(plot.x, plot.y));
        self.plot_plants.remove(&id);
        Self::despawn_indexed(&mut self.world, &mut self.plots, &id);
        Ok(())
    }

    fn find_all_plants(&self) -> Vec<Plant> {
        self.collect_where::<Plant>(|_| true)
    }

    fn find_plant(&self, id: PlantId) -> Option<Plant> {
        self.read(self.plants.get(&id))
    }

    fn find_plants_by_plot(&self, plot: PlotId) -> Vec<Plant> {
        self.plot_plants
            .get(&plot)
            .map(|ids| ids.iter().filter_map(|id| self.find_plant(*id)).collect())
            .unwrap_or_default()
    }

    fn insert_plants(&mut self, plants: Vec<NewPlant>) -> Result<Vec<Plant>> {
        for plant in &plants {
            self.require_plot(plant.plot)?;
            plant.validate()?;
        }
        let mut stored = Vec::with_capacity(plants.len());
        for new in plants {
            let plant = Plant {
                id: PlantId(self.allocate_id()),
                plot: new.plot,
                species: new.species,
                age: new.age,
                maturity_age: new.maturity_age,
                stoloniferous: new.stoloniferous,
                colonization_probability: new.colonization_probability,
            };
            let entity = self.world.spawn((plant.clone(),));
            self.plants.insert(plant.id, entity);
            self.index_plant(plant.plot, plant.id);
            stored.push(plant);
        }
        Ok(stored)
    }

    fn save_all_plants(&mut self, plants: &[Plant]) -> Result<()> {
        for plant in plants {
            if !self.plants.contains_key(&plant.id) {
                return Err(SimulationError::not_found(EntityKind::Plant, plant.id));
            }
            self.require_plot(plant.plot)?;
            check_probability("colonization probability", plant.colonization_probability)?;
        }
        for plant in plants {
            if let Some(stored) = self.find_plant(plant.id) {
                if stored.plot != plant.plot {
                    self.unindex_plant(stored.plot, plant.id);
                    self.index_plant(plant.plot, plant.id);
                }
            }
            self.write(self.plants[&plant.id], plant.clone());
        }
        Ok(())
    }

    fn delete_all_plants(&mut self, ids: &[PlantId]) -> Result<()> {
        for id in ids {
            if let Some(plant) = self.find_plant(*id) {
                self.unindex_plant(plant.plot, plant.id);
            }
            Self::despawn_indexed(&mut self.world, &mut self.plants, id);
        }
        Ok(())
    }

    fn find_all_insects(&self) -> Vec<Insect> {
        self.collect_where::<Insect>(|_| true)
    }

    fn find_insect(&self, id: InsectId) -> Option<Insect> {
        self.read(self.insects.get(&id))
    }

    fn find_insects_by_plot(&self, plot: PlotId) -> Vec<Insect> {
        self.collect_where::<Insect>(|i| i.plot == plot)
    }

    fn find_insects_by_plot_species_not_sex(
        &self,
        plot: PlotId,
        species: &str,
        sex: Sex,
    ) -> Vec<Insect> {
        self.collect_where::<Insect>(|i| i.plot == plot && i.species == species && i.sex != sex)
    }

    fn insert_insects(&mut self, insects: Vec<NewInsect>) -> Result<Vec<Insect>> {
        for insect in &insects {
            self.require_plot(insect.plot)?;
            insect.validate()?;
        }
        let mut stored = Vec::with_capacity(insects.len());
        for new in insects {
            let insect = Insect {
                id: InsectId(self.allocate_id()),
                plot: new.plot,
                species: new.species,
                sex: new.sex,
                health: new.health,
                mobility: new.mobility,
                insecticide_resistance: new.insecticide_resistance,
                hunger: new.hunger,
            };
            let entity = self.world.spawn((insect.clone(),));
            self.insects.insert(insect.id, entity);
            stored.push(insect);
        }
        Ok(stored)
    }

    fn save_all_insects(&mut self, insects: &[Insect]) -> Result<()> {
        for insect in insects {
            if !self.insects.contains_key(&insect.id) {
                return Err(SimulationError::not_found(EntityKind::Insect, insect.id));
            }
            self.require_plot(insect.plot)?;
        }
        for insect in insects {
            self.write(self.insects[&insect.id], insect.clone());
        }
        Ok(())
    }

    fn delete_all_insects(&mut self, ids: &[InsectId]) -> Result<()> {
        for id in ids {
            Self::despawn_indexed(&mut self.world, &mut self.insects, id);
        }
        Ok(())
    }

    fn find_all_devices(&self) -> Vec<Device> {
        self.collect_where::<Device>(|_| true)
    }

    fn find_device(&self, id: DeviceId) -> Option<Device> {
        self.read(self.devices.get(&id))
    }

    fn find_device_by_plot(&self, plot: PlotId) -> Option<Device> {
        let id = self.plot_device.get(&plot)?;
        self.find_device(*id)
    }

    fn insert_device(&mut self, plot: PlotId, radius: u32) -> Result<Device> {
        self.require_plot(plot)?;
        if let Some(existing) = self.find_device_by_plot(plot) {
            return Err(SimulationError::InvalidState(format!(
                "plot {plot} already carries device {}",
                existing.id
            )));
        }
        let device = Device {
            id: DeviceId(self.allocate_id()),
            plot,
            radius,
        };
        let entity = self.world.spawn((device.clone(),));
        self.devices.insert(device.id, entity);
        self.plot_device.insert(plot, device.id);
        Ok(device)
    }

    fn save_device(&mut self, device: &Device) -> Result<()> {
        let stored = self.device(device.id)?;
        if stored.plot != device.plot {
            self.require_plot(device.plot)?;
            if self.find_device_by_plot(device.plot).is_some() {
                return Err(SimulationError::InvalidState(format!(
                    "plot {} already carries a device",
                    device.plot
                )));
            }
            self.plot_device.remove(&stored.plot);
            self.plot_device.insert(device.plot, device.id);
        }
        self.write(self.devices[&device.id], device.clone());
        Ok(())
    }

    fn delete_device(&mut self, id: DeviceId) -> Result<()> {
        let device = self.device(id)?;
        self.plot_device.remove(&device.plot);
        self.remove_programs_of(id);
        Self::despawn_indexed(&mut self.world, &mut self.devices, &id);
        Ok(())
    }

    fn find_all_programs(&self) -> Vec<Program> {
        self.collect_where::<Program>(|_| true)
    }

    fn find_program(&self, id: ProgramId) -> Option<Program> {
        self.read(self.programs.get(&id))
    }

    fn find_programs_by_device(&self, device: DeviceId) -> Vec<Program> {
        self.collect_where::<Program>(|p| p.device == device)
    }

    fn insert_program(&mut self, program: NewProgram) -> Result<Program> {
        if !self.devices.contains_key(&program.device) {
            return Err(SimulationError::not_found(EntityKind::Device, program.device));
        }
        let program = Program {
            id: ProgramId(self.allocate_id()),
            device: program.device,
            start_tick: program.start_tick,
            duration: program.duration,
            treatment: program.treatment,
        };
        let entity = self.world.spawn((program.clone(),));
        self.programs.insert(program.id, entity);
        Ok(program)
    }

    fn save_program(&mut self, program: &Program) -> Result<()> {
        let entity = *self
            .programs
            .get(&program.id)
            .ok_or_else(|| SimulationError::not_found(EntityKind::Program, program.id))?;
        if !self.devices.contains_key(&program.device) {
            return Err(SimulationError::not_found(EntityKind::Device, program.device));
        }
        self.write(entity, program.clone());
        Ok(())
    }

    fn delete_program(&mut self, id: ProgramId) -> Result<()> {
        if !self.programs.contains_key(&id) {
            return Err(SimulationError::not_found(EntityKind::Program, id));
        }
        Self::despawn_indexed(&mut self.world, &mut self.programs, &id);
        Ok(())
    }

    fn clear_dependents(&mut self) {
        let doomed: Vec<Entity> = self
            .plants
            .drain()
            .map(|(_, e)| e)
            .chain(self.insects.drain().map(|(_, e)| e))
            .chain(self.devices.drain().map(|(_, e)| e))
            .chain(self.programs.drain().map(|(_, e)| e))
            .collect();
        self.plot_plants.clear();
        self.plot_device.clear();
        for entity in doomed {
            let _ = self.world.despawn(entity);
        }
    }

    fn clear(&mut self) {
        self.world.clear();
        self.plots.clear();
        self.plot_coords.clear();
        self.plants.clear();
        self.insects.clear();
        self.devices.clear();
        self.programs.clear();
        self.plot_plants.clear();
        self.plot_device.clear();
        self.next_id = 1;
    }

    fn contents(&self) -> StoreContents {
        StoreContents {
            next_id: self.next_id,
            plots: self.find_all_plots(),
            plants: self.find_all_plants(),
            insects: self.find_all_insects(),
            devices: self.find_all_devices(),
            programs: self.find_all_programs(),
        }
    }

    fn restore(&mut self, contents: StoreContents) -> Result<()> {
        *self = Self::from_contents(contents)?;
        Ok(())
    }
}
