use serde::Deserialize;
use simulation::{
    check_probability, Insect, InsectId, NewInsect, PlotId, Result, Sex, SimulationError,
    DEFAULT_HEALTH, MAX_HEALTH,
};

use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateInsect {
    pub plot: PlotId,
    pub species: String,
    /// "M" or "F".
    pub sex: String,
    pub mobility: f64,
    pub insecticide_resistance: f64,
    pub health: Option<u8>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InsectUpdate {
    pub plot: Option<PlotId>,
    pub species: Option<String>,
    pub sex: Option<String>,
    pub health: Option<u8>,
    pub mobility: Option<f64>,
    pub insecticide_resistance: Option<f64>,
    pub hunger: Option<u32>,
}

pub fn list_insects(state: &AppState) -> Vec<Insect> {
    state.clock.world().store().find_all_insects()
}

pub fn get_insect(state: &AppState, id: InsectId) -> Result<Insect> {
    state.clock.world().store().insect(id)
}

pub fn insects_by_plot(state: &AppState, plot: PlotId) -> Result<Vec<Insect>> {
    let world = state.clock.world();
    world.store().plot(plot)?;
    Ok(world.store().find_insects_by_plot(plot))
}

pub fn insects_by_species(state: &AppState, species: &str) -> Vec<Insect> {
    list_insects(state)
        .into_iter()
        .filter(|i| i.species.eq_ignore_ascii_case(species))
        .collect()
}

/// `sex` is "M" or "F".
pub fn insects_by_sex(state: &AppState, sex: &str) -> Result<Vec<Insect>> {
    let sex: Sex = sex.parse()?;
    Ok(list_insects(state).into_iter().filter(|i| i.sex == sex).collect())
}

impl TryFrom<CreateInsect> for NewInsect {
    type Error = SimulationError;

    fn try_from(request: CreateInsect) -> Result<Self> {
        let sex: Sex = request.sex.parse()?;
        let mut insect = NewInsect::new(request.plot, request.species, sex)
            .with_mobility(request.mobility)
            .with_resistance(request.insecticide_resistance);
        insect.health = request.health.unwrap_or(DEFAULT_HEALTH);
        Ok(insect)
    }
}

/// New insects start with health 8 unless told otherwise, and no hunger.
pub fn create_insect(state: &AppState, request: CreateInsect) -> Result<Insect> {
    let mut created = create_insects(state, vec![request])?;
    Ok(created.remove(0))
}

/// Creates every insect or none of them.
pub fn create_insects(state: &AppState, requests: Vec<CreateInsect>) -> Result<Vec<Insect>> {
    let insects = requests
        .into_iter()
        .map(NewInsect::try_from)
        .collect::<Result<Vec<_>>>()?;
    state.clock.world().store_mut().insert_insects(insects)
}

pub fn update_insect(state: &AppState, id: InsectId, update: InsectUpdate) -> Result<Insect> {
    let mut world = state.clock.world();
    let store = world.store_mut();
    let mut insect = store.insect(id)?;

    if let Some(plot) = update.plot {
        insect.plot = plot;
    }
    if let Some(species) = update.species {
        insect.species = species;
    }
    if let Some(sex) = update.sex {
        insect.sex = sex.parse()?;
    }
    if let Some(health) = update.health {
        if health > MAX_HEALTH {
            return Err(SimulationError::Validation(format!(
                "health must be within 0..={MAX_HEALTH}, got {health}"
            )));
        }
        insect.health = health;
    }
    if let Some(mobility) = update.mobility {
        check_probability("mobility", mobility)?;
        insect.mobility = mobility;
    }
    if let Some(resistance) = update.insecticide_resistance {
        check_probability("insecticide resistance", resistance)?;
        insect.insecticide_resistance = resistance;
    }
    if let Some(hunger) = update.hunger {
        insect.hunger = hunger;
    }

    store.save_all_insects(std::slice::from_ref(&insect))?;
    Ok(insect)
}

pub fn delete_insect(state: &AppState, id: InsectId) -> Result<()> {
    let mut world = state.clock.world();
    let store = world.store_mut();
    store.insect(id)?;
    store.delete_all_insects(&[id])
}
