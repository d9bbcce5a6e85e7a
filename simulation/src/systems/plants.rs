//! Plant Growth System
//!
//! Ages every plant and lets mature stoloniferous plants spread to
//! neighbouring plots.

use rand::Rng;

use crate::components::NewPlant;
use crate::error::Result;
use crate::store::GridStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrowthResult {
    pub aged: u32,
    pub colonizers: u32,
    pub offshoots: u32,
}

/// Age all plants first, then store the offshoots, so a new plant neither
/// ages nor spreads during the tick it appears.
pub fn plant_growth_system<R: Rng + ?Sized>(
    store: &mut dyn GridStore,
    rng: &mut R,
) -> Result<GrowthResult> {
    let mut plants = store.find_all_plants();
    let mut offshoots: Vec<NewPlant> = Vec::new();
    let mut colonizers = 0u32;

    for plant in &mut plants {
        plant.grow();

        if !plant.try_colonize(rng) {
            continue;
        }
        colonizers += 1;

        let home = store.plot(plant.plot)?;
        for neighbor in store.find_neighbor_plots(home.x, home.y) {
            if rng.gen::<f64>() < plant.colonization_probability {
                offshoots.push(plant.offshoot(neighbor.id));
            }
        }
    }

    store.save_all_plants(&plants)?;
    let spawned = store.insert_plants(offshoots)?;

    Ok(GrowthResult {
        aged: plants.len() as u32,
        colonizers,
        offshoots: spawned.len() as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::*;
    use crate::store::HecsGridStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn garden() -> HecsGridStore {
        let mut store = HecsGridStore::new();
        for x in 0..3 {
            for y in 0..3 {
                store.insert_plot(x, y, DEFAULT_MOISTURE).unwrap();
            }
        }
        store
    }

    #[test]
    fn test_every_plant_ages_by_one() {
        let mut store = garden();
        let plot = store.plot_at(0, 0).unwrap();
        let mut carrot = NewPlant::new(plot.id, "Carotte", 12);
        carrot.age = 4;
        store
            .insert_plants(vec![carrot, NewPlant::new(plot.id, "Salade", 7)])
            .unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        let result = plant_growth_system(&mut store, &mut rng).unwrap();
        assert_eq!(result.aged, 2);
        assert_eq!(result.offshoots, 0);

        let ages: Vec<u32> = store.find_all_plants().iter().map(|p| p.age).collect();
        assert_eq!(ages, vec![5, 1]);
    }

    #[test]
    fn test_certain_colonizer_fills_all_neighbors() {
        let mut store = garden();
        let centre = store.plot_at(1, 1).unwrap();
        let mut mint = NewPlant::new(centre.id, "Menthe", 0).stoloniferous(1.0);
        mint.age = 3;
        store.insert_plants(vec![mint]).unwrap();

        let mut rng = StdRng::seed_from_u64(2);
        let result = plant_growth_system(&mut store, &mut rng).unwrap();
        assert_eq!(result.colonizers, 1);
        assert_eq!(result.offshoots, 8);

        let plants = store.find_all_plants();
        let parent = plants.iter().find(|p| p.plot == centre.id).unwrap();
        assert_eq!(parent.age, 4);
        for child in plants.iter().filter(|p| p.plot != centre.id) {
            assert_eq!(child.age, 0);
            assert_eq!(child.species, "Menthe");
            assert!(child.stoloniferous);
            assert_eq!(child.colonization_probability, 1.0);
        }
    }

    #[test]
    fn test_immature_or_plain_plants_do_not_spread() {
        let mut store = garden();
        let centre = store.plot_at(1, 1).unwrap();
        store
            .insert_plants(vec![
                NewPlant::new(centre.id, "Fraisier", 8).stoloniferous(1.0),
                NewPlant::new(centre.id, "Tomate", 0),
            ])
            .unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        let result = plant_growth_system(&mut store, &mut rng).unwrap();
        assert_eq!(result.colonizers, 0);
        assert_eq!(store.find_all_plants().len(), 2);
    }
}
