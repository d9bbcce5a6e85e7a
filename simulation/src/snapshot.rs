//! Immutable world-state snapshots, built at the end of each tick and handed
//! to the publisher.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::*;
use crate::store::GridStore;

/// Coarse moisture label shown next to each plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoistureCategory {
    #[serde(rename = "sec")]
    Dry,
    #[serde(rename = "modéré")]
    Moderate,
    #[serde(rename = "humide")]
    Wet,
}

impl MoistureCategory {
    pub fn of(moisture: f64) -> Self {
        if moisture < 30.0 {
            MoistureCategory::Dry
        } else if moisture < 70.0 {
            MoistureCategory::Moderate
        } else {
            MoistureCategory::Wet
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MoistureCategory::Dry => "sec",
            MoistureCategory::Moderate => "modéré",
            MoistureCategory::Wet => "humide",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldStateSnapshot {
    pub tick: u64,
    pub running: bool,
    pub width: i64,
    pub height: i64,
    pub plots: Vec<PlotSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSnapshot {
    pub id: PlotId,
    pub x: i32,
    pub y: i32,
    pub moisture: f64,
    pub moisture_category: MoistureCategory,
    pub plants: Vec<PlantSnapshot>,
    pub insects: Vec<Insect>,
    pub device: Option<DeviceSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantSnapshot {
    #[serde(flatten)]
    pub plant: Plant,
    pub mature: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub id: DeviceId,
    pub radius: u32,
    /// Every program of the device, active or not.
    pub programs: Vec<Program>,
}

impl WorldStateSnapshot {
    /// Capture the whole store. Grid dimensions are the largest coordinate
    /// seen plus one on each axis (0x0 for an empty garden).
    pub fn capture(store: &dyn GridStore, tick: u64, running: bool) -> Self {
        let plots = store.find_all_plots();

        let mut plants: HashMap<PlotId, Vec<PlantSnapshot>> = HashMap::new();
        for plant in store.find_all_plants() {
            let mature = plant.is_mature();
            plants.entry(plant.plot).or_default().push(PlantSnapshot { plant, mature });
        }

        let mut insects: HashMap<PlotId, Vec<Insect>> = HashMap::new();
        for insect in store.find_all_insects() {
            insects.entry(insect.plot).or_default().push(insect);
        }

        let mut programs: HashMap<DeviceId, Vec<Program>> = HashMap::new();
        for program in store.find_all_programs() {
            programs.entry(program.device).or_default().push(program);
        }

        let devices: HashMap<PlotId, Device> = store
            .find_all_devices()
            .into_iter()
            .map(|d| (d.plot, d))
            .collect();

        let width = plots.iter().map(|p| i64::from(p.x) + 1).max().unwrap_or(0).max(0);
        let height = plots.iter().map(|p| i64::from(p.y) + 1).max().unwrap_or(0).max(0);

        let plots = plots
            .par_iter()
            .map(|plot| PlotSnapshot {
                id: plot.id,
                x: plot.x,
                y: plot.y,
                moisture: plot.moisture,
                moisture_category: MoistureCategory::of(plot.moisture),
                plants: plants.get(&plot.id).cloned().unwrap_or_default(),
                insects: insects.get(&plot.id).cloned().unwrap_or_default(),
                device: devices.get(&plot.id).map(|device| DeviceSnapshot {
                    id: device.id,
                    radius: device.radius,
                    programs: programs.get(&device.id).cloned().unwrap_or_default(),
                }),
            })
            .collect();

        Self {
            tick,
            running,
            width,
            height,
            plots,
        }
    }

    pub fn plant_count(&self) -> usize {
        self.plots.iter().map(|p| p.plants.len()).sum()
    }

    pub fn insect_count(&self) -> usize {
        self.plots.iter().map(|p| p.insects.len()).sum()
    }

    pub fn device_count(&self) -> usize {
        self.plots.iter().filter(|p| p.device.is_some()).count()
    }

    pub fn plot_at(&self, x: i32, y: i32) -> Option<&PlotSnapshot> {
        self.plots.iter().find(|p| p.x == x && p.y == y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::HecsGridStore;

    #[test]
    fn test_moisture_category_boundaries() {
        assert_eq!(MoistureCategory::of(0.0), MoistureCategory::Dry);
        assert_eq!(MoistureCategory::of(29.9), MoistureCategory::Dry);
        assert_eq!(MoistureCategory::of(30.0), MoistureCategory::Moderate);
        assert_eq!(MoistureCategory::of(69.9), MoistureCategory::Moderate);
        assert_eq!(MoistureCategory::of(70.0), MoistureCategory::Wet);
        assert_eq!(
            serde_json::to_string(&MoistureCategory::Moderate).unwrap(),
            "\"modéré\""
        );
    }

    #[test]
    fn test_empty_store_snapshot() {
        let store = HecsGridStore::new();
        let snapshot = WorldStateSnapshot::capture(&store, 0, false);
        assert_eq!(snapshot.width, 0);
        assert_eq!(snapshot.height, 0);
        assert!(snapshot.plots.is_empty());
    }

    #[test]
    fn test_extreme_coordinates_do_not_overflow() {
        let mut store = HecsGridStore::new();
        store.insert_plot(i32::MAX, 0, 50.0).unwrap();
        store.insert_plot(0, i32::MAX, 50.0).unwrap();
        let snapshot = WorldStateSnapshot::capture(&store, 3, false);
        assert_eq!(snapshot.width, i64::from(i32::MAX) + 1);
        assert_eq!(snapshot.height, i64::from(i32::MAX) + 1);
        assert_eq!(snapshot.plots.len(), 2);
    }

    #[test]
    fn test_snapshot_nests_entities_under_their_plot() {
        let mut store = HecsGridStore::new();
        let home = store.insert_plot(0, 0, 20.0).unwrap();
        store.insert_plot(3, 1, 80.0).unwrap();
        store
            .insert_plants(vec![NewPlant::new(home.id, "Menthe", 0).stoloniferous(0.5)])
            .unwrap();
        store
            .insert_insects(vec![NewInsect::new(home.id, "Abeille", Sex::Female)])
            .unwrap();
        let device = store.insert_device(home.id, 1).unwrap();
        store
            .insert_program(NewProgram {
                device: device.id,
                start_tick: 50,
                duration: 2,
                treatment: TreatmentType::Water,
            })
            .unwrap();

        let snapshot = WorldStateSnapshot::capture(&store, 7, true);
        assert_eq!(snapshot.tick, 7);
        assert!(snapshot.running);
        assert_eq!((snapshot.width, snapshot.height), (4, 2));
        assert_eq!(snapshot.plant_count(), 1);
        assert_eq!(snapshot.insect_count(), 1);
        assert_eq!(snapshot.device_count(), 1);

        let home = snapshot.plot_at(0, 0).unwrap();
        assert_eq!(home.moisture_category, MoistureCategory::Dry);
        assert!(home.plants[0].mature);
        let device = home.device.as_ref().unwrap();
        assert_eq!(device.programs.len(), 1);

        let far = snapshot.plot_at(3, 1).unwrap();
        assert_eq!(far.moisture_category, MoistureCategory::Wet);
        assert!(far.device.is_none());
    }
}
