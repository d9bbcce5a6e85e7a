//! Default garden generation
//!
//! Builds a fresh grid and scatters starter plants, insects and the two
//! preconfigured treatment devices over it.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

use crate::components::*;
use crate::config::GardenConfig;
use crate::error::{Result, SimulationError};
use crate::store::GridStore;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlantSpecies {
    pub name: &'static str,
    pub maturity_age: u32,
    pub stoloniferous: bool,
    pub colonization_probability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsectSpecies {
    pub name: &'static str,
    pub mobility: f64,
    pub insecticide_resistance: f64,
}

pub const PLANT_SPECIES: &[PlantSpecies] = &[
    PlantSpecies { name: "Tomate", maturity_age: 10, stoloniferous: false, colonization_probability: 0.0 },
    PlantSpecies { name: "Fraisier", maturity_age: 8, stoloniferous: true, colonization_probability: 0.3 },
    PlantSpecies { name: "Carotte", maturity_age: 12, stoloniferous: false, colonization_probability: 0.0 },
    PlantSpecies { name: "Menthe", maturity_age: 5, stoloniferous: true, colonization_probability: 0.5 },
    PlantSpecies { name: "Salade", maturity_age: 7, stoloniferous: false, colonization_probability: 0.0 },
];

pub const INSECT_SPECIES: &[InsectSpecies] = &[
    InsectSpecies { name: "Coccinelle", mobility: 0.5, insecticide_resistance: 0.7 },
    InsectSpecies { name: "Puceron", mobility: 0.3, insecticide_resistance: 0.2 },
    InsectSpecies { name: "Fourmi", mobility: 0.6, insecticide_resistance: 0.4 },
    InsectSpecies { name: "Abeille", mobility: 0.8, insecticide_resistance: 0.5 },
    InsectSpecies { name: "Chenille", mobility: 0.2, insecticide_resistance: 0.3 },
];

impl PlantSpecies {
    pub fn sprout(&self, plot: PlotId) -> NewPlant {
        let plant = NewPlant::new(plot, self.name, self.maturity_age);
        if self.stoloniferous {
            plant.stoloniferous(self.colonization_probability)
        } else {
            plant
        }
    }
}

impl InsectSpecies {
    pub fn hatch(&self, plot: PlotId, sex: Sex, health: u8) -> NewInsect {
        let mut insect = NewInsect::new(plot, self.name, sex)
            .with_mobility(self.mobility)
            .with_resistance(self.insecticide_resistance);
        insect.health = health;
        insect
    }
}

/// What [`initialize_default_garden`] created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GardenSummary {
    pub plots: usize,
    pub plants: usize,
    pub insects: usize,
    pub devices: usize,
    pub programs: usize,
}

/// Wipe the store and lay out a new garden.
pub fn initialize_default_garden<R: Rng + ?Sized>(
    store: &mut dyn GridStore,
    garden: &GardenConfig,
    rng: &mut R,
) -> Result<GardenSummary> {
    if garden.width <= 0 || garden.height <= 0 {
        return Err(SimulationError::Validation(format!(
            "garden must be at least 1x1, got {}x{}",
            garden.width, garden.height
        )));
    }

    store.clear();
    let moisture = clamp_moisture(garden.initial_moisture);

    let mut plots = Vec::with_capacity((garden.width * garden.height) as usize);
    for x in 0..garden.width {
        for y in 0..garden.height {
            plots.push(store.insert_plot(x, y, moisture)?);
        }
    }

    let mut summary = GardenSummary {
        plots: plots.len(),
        ..GardenSummary::default()
    };

    let mut plants = Vec::with_capacity(garden.starter_plants);
    for _ in 0..garden.starter_plants {
        let (Some(plot), Some(species)) = (plots.choose(rng), PLANT_SPECIES.choose(rng)) else {
            break;
        };
        plants.push(species.sprout(plot.id));
    }
    summary.plants = store.insert_plants(plants)?.len();

    let mut insects = Vec::with_capacity(garden.starter_insects);
    for _ in 0..garden.starter_insects {
        let (Some(plot), Some(species)) = (plots.choose(rng), INSECT_SPECIES.choose(rng)) else {
            break;
        };
        let sex = Sex::random(rng);
        let health = rng.gen_range(7..=MAX_HEALTH);
        insects.push(species.hatch(plot.id, sex, health));
    }
    summary.insects = store.insert_insects(insects)?.len();

    if garden.default_devices {
        let (devices, programs) = install_default_devices(store, garden)?;
        summary.devices = devices;
        summary.programs = programs;
    }

    info!(
        width = garden.width,
        height = garden.height,
        plants = summary.plants,
        insects = summary.insects,
        devices = summary.devices,
        "default garden initialized"
    );
    Ok(summary)
}

/// Sprinkler + insecticide on the centre plot, fertilizer in the (0,0)
/// corner. The centre device needs at least a 3x3 grid.
fn install_default_devices(
    store: &mut dyn GridStore,
    garden: &GardenConfig,
) -> Result<(usize, usize)> {
    let mut devices = 0;
    let mut programs = 0;

    if garden.width >= 3 && garden.height >= 3 {
        let centre = store.plot_at(garden.width / 2, garden.height / 2)?;
        let device = store.insert_device(centre.id, DEFAULT_RADIUS)?;
        devices += 1;
        for (start_tick, duration, treatment) in
            [(10, 5, TreatmentType::Water), (20, 3, TreatmentType::Insecticide)]
        {
            store.insert_program(NewProgram { device: device.id, start_tick, duration, treatment })?;
            programs += 1;
        }
    }

    let corner = store.plot_at(0, 0)?;
    let device = store.insert_device(corner.id, 1)?;
    devices += 1;
    store.insert_program(NewProgram {
        device: device.id,
        start_tick: 30,
        duration: 8,
        treatment: TreatmentType::Fertilizer,
    })?;
    programs += 1;

    Ok((devices, programs))
}
