//! Insect System
//!
//! Per insect, in this order: feed, starve/die, wander, reproduce.
//! Each survivor is written back before the next insect is processed, so
//! later insects see earlier moves when they look for a mate. Deaths and
//! births are applied once every insect has been handled.

use std::collections::HashSet;

use rand::Rng;

use crate::components::{InsectId, NewInsect, Sex};
use crate::config::TickRules;
use crate::error::Result;
use crate::store::GridStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsectResult {
    pub deaths: u32,
    pub moves: u32,
    pub births: u32,
}

pub fn insect_system<R: Rng + ?Sized>(
    store: &mut dyn GridStore,
    rules: &TickRules,
    rng: &mut R,
) -> Result<InsectResult> {
    let mut dead: HashSet<InsectId> = HashSet::new();
    let mut newborns: Vec<NewInsect> = Vec::new();
    let mut moves = 0u32;

    for mut insect in store.find_all_insects() {
        let food_available = !store.find_plants_by_plot(insect.plot).is_empty();
        insect.feed(food_available);

        if !insect.is_alive() {
            dead.insert(insect.id);
            continue;
        }

        if insect.try_move(rng) {
            let here = store.plot(insect.plot)?;
            let neighbors = store.find_neighbor_plots(here.x, here.y);
            if !neighbors.is_empty() {
                let pick = rng.gen_range(0..neighbors.len());
                insect.plot = neighbors[pick].id;
                moves += 1;
            }
        }

        store.save_all_insects(std::slice::from_ref(&insect))?;

        if insect.health > rules.reproduction_health_threshold {
            let has_mate = store
                .find_insects_by_plot_species_not_sex(insect.plot, &insect.species, insect.sex)
                .iter()
                .any(|mate| !dead.contains(&mate.id));
            if has_mate && rng.gen::<f64>() < rules.reproduction_chance {
                newborns.push(insect.offspring(Sex::random(rng), rules.newborn_health));
            }
        }
    }

    let doomed: Vec<InsectId> = dead.into_iter().collect();
    store.delete_all_insects(&doomed)?;
    let born = store.insert_insects(newborns)?;

    Ok(InsectResult {
        deaths: doomed.len() as u32,
        moves,
        births: born.len() as u32,
    })
}
