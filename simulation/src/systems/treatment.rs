//! Treatment System
//!
//! Applies the active programs of every device to all plots within the
//! device radius, plus immediate manual treatments.

use rand::Rng;
use tracing::trace;

use crate::components::{active_programs, DeviceId, TreatmentType};
use crate::config::{ManualTreatment, TickRules};
use crate::error::Result;
use crate::store::GridStore;

/// Effect sizes of one treatment application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreatmentStrength {
    pub water_amount: f64,
    pub insecticide_power: f64,
    pub fertilizer_chance: f64,
}

impl From<&TickRules> for TreatmentStrength {
    fn from(rules: &TickRules) -> Self {
        Self {
            water_amount: rules.water_amount,
            insecticide_power: rules.insecticide_power,
            fertilizer_chance: rules.fertilizer_chance,
        }
    }
}

impl From<&ManualTreatment> for TreatmentStrength {
    fn from(manual: &ManualTreatment) -> Self {
        Self {
            water_amount: manual.water_amount,
            insecticide_power: manual.insecticide_power,
            fertilizer_chance: manual.fertilizer_chance,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreatmentResult {
    pub devices: u32,
    pub programs_applied: u32,
    pub plots_treated: u32,
}

/// Run every program active at `tick`, device by device in plot order.
pub fn treatment_system<R: Rng + ?Sized>(
    store: &mut dyn GridStore,
    tick: u64,
    rules: &TickRules,
    rng: &mut R,
) -> Result<TreatmentResult> {
    let strength = TreatmentStrength::from(rules);
    let mut result = TreatmentResult::default();

    for plot in store.find_all_plots() {
        let Some(device) = store.find_device_by_plot(plot.id) else {
            continue;
        };
        result.devices += 1;

        let programs = store.find_programs_by_device(device.id);
        for program in active_programs(&programs, tick) {
            trace!(
                tick,
                program = program.id.0,
                treatment = %program.treatment,
                x = plot.x,
                y = plot.y,
                radius = device.radius,
                "applying scheduled treatment"
            );
            let treated = apply_in_radius(
                store,
                (plot.x, plot.y),
                device.radius,
                program.treatment,
                strength,
                rng,
            )?;
            result.programs_applied += 1;
            result.plots_treated += treated as u32;
        }
    }

    Ok(result)
}

/// Apply `treatment` right now around a device, ignoring its programs.
/// Returns the number of plots reached.
pub fn apply_manual_treatment<R: Rng + ?Sized>(
    store: &mut dyn GridStore,
    device: DeviceId,
    treatment: TreatmentType,
    manual: &ManualTreatment,
    rng: &mut R,
) -> Result<usize> {
    let device = store.device(device)?;
    let centre = store.plot(device.plot)?;
    trace!(device = device.id.0, treatment = %treatment, "applying manual treatment");
    apply_in_radius(
        store,
        (centre.x, centre.y),
        device.radius,
        treatment,
        TreatmentStrength::from(manual),
        rng,
    )
}

fn apply_in_radius<R: Rng + ?Sized>(
    store: &mut dyn GridStore,
    (x, y): (i32, i32),
    radius: u32,
    treatment: TreatmentType,
    strength: TreatmentStrength,
    rng: &mut R,
) -> Result<usize> {
    let mut plots = store.find_plots_within_radius(x, y, radius);

    match treatment {
        TreatmentType::Water => {
            for plot in &mut plots {
                plot.add_moisture(strength.water_amount);
            }
            store.save_all_plots(&plots)?;
        }
        TreatmentType::Insecticide => {
            for plot in &plots {
                let mut insects = store.find_insects_by_plot(plot.id);
                for insect in &mut insects {
                    insect.apply_insecticide(strength.insecticide_power, rng);
                }
                store.save_all_insects(&insects)?;
            }
        }
        TreatmentType::Fertilizer => {
            for plot in &plots {
                let mut plants = store.find_plants_by_plot(plot.id);
                for plant in &mut plants {
                    if rng.gen::<f64>() < strength.fertilizer_chance {
                        plant.grow();
                    }
                }
                store.save_all_plants(&plants)?;
            }
        }
    }

    Ok(plots.len())
}
