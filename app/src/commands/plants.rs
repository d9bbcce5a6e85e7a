use std::collections::BTreeMap;

use serde::Deserialize;
use simulation::{check_probability, NewPlant, Plant, PlantId, PlotId, Result};

use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlant {
    pub plot: PlotId,
    pub species: String,
    pub maturity_age: u32,
    #[serde(default)]
    pub stoloniferous: bool,
    #[serde(default)]
    pub colonization_probability: f64,
}

/// Fields left as `None` keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlantUpdate {
    pub species: Option<String>,
    pub age: Option<u32>,
    pub maturity_age: Option<u32>,
    pub stoloniferous: Option<bool>,
    pub colonization_probability: Option<f64>,
}

pub fn list_plants(state: &AppState) -> Vec<Plant> {
    state.clock.world().store().find_all_plants()
}

pub fn get_plant(state: &AppState, id: PlantId) -> Result<Plant> {
    state.clock.world().store().plant(id)
}

pub fn plants_by_plot(state: &AppState, plot: PlotId) -> Result<Vec<Plant>> {
    let world = state.clock.world();
    world.store().plot(plot)?;
    Ok(world.store().find_plants_by_plot(plot))
}

pub fn plants_by_species(state: &AppState, species: &str) -> Vec<Plant> {
    list_plants(state)
        .into_iter()
        .filter(|p| p.species.eq_ignore_ascii_case(species))
        .collect()
}

pub fn mature_plants(state: &AppState) -> Vec<Plant> {
    list_plants(state).into_iter().filter(Plant::is_mature).collect()
}

pub fn stoloniferous_plants(state: &AppState) -> Vec<Plant> {
    list_plants(state).into_iter().filter(|p| p.stoloniferous).collect()
}

/// Number of plants per species, sorted by species name.
pub fn count_by_species(state: &AppState) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for plant in list_plants(state) {
        *counts.entry(plant.species).or_insert(0) += 1;
    }
    counts
}

impl From<CreatePlant> for NewPlant {
    fn from(request: CreatePlant) -> Self {
        let mut plant = NewPlant::new(request.plot, request.species, request.maturity_age);
        plant.stoloniferous = request.stoloniferous;
        plant.colonization_probability = request.colonization_probability;
        plant
    }
}

pub fn create_plant(state: &AppState, request: CreatePlant) -> Result<Plant> {
    let mut created = create_plants(state, vec![request])?;
    Ok(created.remove(0))
}

/// Creates every plant or none of them.
pub fn create_plants(state: &AppState, requests: Vec<CreatePlant>) -> Result<Vec<Plant>> {
    let plants = requests.into_iter().map(NewPlant::from).collect();
    state.clock.world().store_mut().insert_plants(plants)
}

pub fn update_plant(state: &AppState, id: PlantId, update: PlantUpdate) -> Result<Plant> {
    let mut world = state.clock.world();
    let store = world.store_mut();
    let mut plant = store.plant(id)?;

    if let Some(species) = update.species {
        plant.species = species;
    }
    if let Some(age) = update.age {
        plant.age = age;
    }
    if let Some(maturity_age) = update.maturity_age {
        plant.maturity_age = maturity_age;
    }
    if let Some(stoloniferous) = update.stoloniferous {
        plant.stoloniferous = stoloniferous;
    }
    if let Some(p) = update.colonization_probability {
        check_probability("colonization probability", p)?;
        plant.colonization_probability = p;
    }

    store.save_all_plants(std::slice::from_ref(&plant))?;
    Ok(plant)
}

pub fn delete_plant(state: &AppState, id: PlantId) -> Result<()> {
    let mut world = state.clock.world();
    let store = world.store_mut();
    store.plant(id)?;
    store.delete_all_plants(&[id])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::plots::get_plot_at;
    use crate::commands::testing::empty_garden;
    use simulation::SimulationError;

    fn mint(plot: PlotId) -> CreatePlant {
        CreatePlant {
            plot,
            species: "Menthe".into(),
            maturity_age: 5,
            stoloniferous: true,
            colonization_probability: 0.5,
        }
    }

    #[test]
    fn test_create_get_delete() {
        let state = empty_garden();
        let plot = get_plot_at(&state, 2, 2).unwrap();
        let plant = create_plant(&state, mint(plot.id)).unwrap();
        assert_eq!(plant.age, 0);
        assert_eq!(get_plant(&state, plant.id).unwrap(), plant);
        assert_eq!(plants_by_plot(&state, plot.id).unwrap(), vec![plant.clone()]);

        delete_plant(&state, plant.id).unwrap();
        assert!(get_plant(&state, plant.id).unwrap_err().is_not_found());
        assert!(delete_plant(&state, plant.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_create_on_unknown_plot() {
        let state = empty_garden();
        let err = create_plant(&state, mint(PlotId(4_242))).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_invalid_probability_rejected() {
        let state = empty_garden();
        let plot = get_plot_at(&state, 0, 0).unwrap();
        let mut request = mint(plot.id);
        request.colonization_probability = 2.0;
        assert!(matches!(create_plant(&state, request), Err(SimulationError::Validation(_))));

        let plant = create_plant(&state, mint(plot.id)).unwrap();
        let update = PlantUpdate {
            colonization_probability: Some(-0.1),
            ..PlantUpdate::default()
        };
        assert!(matches!(update_plant(&state, plant.id, update), Err(SimulationError::Validation(_))));
    }

    #[test]
    fn test_bulk_create_is_all_or_nothing() {
        let state = empty_garden();
        let plot = get_plot_at(&state, 4, 4).unwrap();
        let created = create_plants(&state, vec![mint(plot.id), mint(plot.id)]).unwrap();
        assert_eq!(created.len(), 2);
        assert_ne!(created[0].id, created[1].id);

        let err = create_plants(&state, vec![mint(plot.id), mint(PlotId(4_242))]).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(list_plants(&state).len(), 2);
    }

    #[test]
    fn test_stoloniferous_and_species_counts() {
        let state = empty_garden();
        let plot = get_plot_at(&state, 0, 4).unwrap();
        let carotte = CreatePlant {
            plot: plot.id,
            species: "Carotte".into(),
            maturity_age: 12,
            stoloniferous: false,
            colonization_probability: 0.0,
        };
        create_plants(&state, vec![mint(plot.id), carotte.clone(), carotte]).unwrap();

        let runners = stoloniferous_plants(&state);
        assert_eq!(runners.len(), 1);
        assert_eq!(runners[0].species, "Menthe");

        let counts = count_by_species(&state);
        assert_eq!(counts.get("Carotte"), Some(&2));
        assert_eq!(counts.get("Menthe"), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_update_and_filters() {
        let state = empty_garden();
        let plot = get_plot_at(&state, 1, 3).unwrap();
        let menthe = create_plant(&state, mint(plot.id)).unwrap();
        create_plant(
            &state,
            CreatePlant {
                plot: plot.id,
                species: "Carotte".into(),
                maturity_age: 12,
                stoloniferous: false,
                colonization_probability: 0.0,
            },
        )
        .unwrap();

        let updated = update_plant(
            &state,
            menthe.id,
            PlantUpdate { age: Some(6), ..PlantUpdate::default() },
        )
        .unwrap();
        assert!(updated.is_mature());
        assert_eq!(updated.species, "Menthe");

        let mature = mature_plants(&state);
        assert_eq!(mature.len(), 1);
        assert_eq!(mature[0].id, menthe.id);
        assert_eq!(plants_by_species(&state, "carotte").len(), 1);
        assert!(plants_by_species(&state, "Fraisier").is_empty());
    }
}
