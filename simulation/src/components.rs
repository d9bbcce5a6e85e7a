//! Garden entities and their per-entity behaviour rules.
//!
//! Plots are the spatial root; plants, insects and devices each belong to
//! exactly one plot, programs belong to exactly one device. The rules here
//! only touch the entity they are called on; anything that needs the rest
//! of the garden lives in `systems`.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

// ============================================================================
// Identity
// ============================================================================

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(PlotId);
entity_id!(PlantId);
entity_id!(InsectId);
entity_id!(DeviceId);
entity_id!(ProgramId);

/// Rejects probabilities outside [0, 1] (and NaN).
pub fn check_probability(field: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimulationError::Validation(format!(
            "{field} must be within [0, 1], got {value}"
        )))
    }
}

// ============================================================================
// Plot
// ============================================================================

pub const MOISTURE_MIN: f64 = 0.0;
pub const MOISTURE_MAX: f64 = 100.0;
pub const DEFAULT_MOISTURE: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plot {
    pub id: PlotId,
    pub x: i32,
    pub y: i32,
    pub moisture: f64,
}

impl Plot {
    pub fn add_moisture(&mut self, amount: f64) {
        self.moisture = (self.moisture + amount).min(MOISTURE_MAX);
    }

    pub fn remove_moisture(&mut self, amount: f64) {
        self.moisture = (self.moisture - amount).max(MOISTURE_MIN);
    }

    /// Overwrite the moisture level, clamped to [0, 100].
    pub fn set_moisture(&mut self, moisture: f64) {
        self.moisture = clamp_moisture(moisture);
    }

    /// Squared euclidean distance to another cell.
    pub fn distance_sq(&self, x: i32, y: i32) -> i64 {
        let dx = i64::from(self.x) - i64::from(x);
        let dy = i64::from(self.y) - i64::from(y);
        dx * dx + dy * dy
    }

    /// 8-connected adjacency (Chebyshev distance 1, never self).
    pub fn is_adjacent_to(&self, x: i32, y: i32) -> bool {
        let dx = (i64::from(self.x) - i64::from(x)).abs();
        let dy = (i64::from(self.y) - i64::from(y)).abs();
        dx.max(dy) == 1
    }
}

pub fn clamp_moisture(moisture: f64) -> f64 {
    if moisture.is_nan() {
        return MOISTURE_MIN;
    }
    moisture.clamp(MOISTURE_MIN, MOISTURE_MAX)
}

// ============================================================================
// Plant
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    pub id: PlantId,
    pub plot: PlotId,
    pub species: String,
    pub age: u32,
    pub maturity_age: u32,
    pub stoloniferous: bool,
    pub colonization_probability: f64,
}

/// A plant that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPlant {
    pub plot: PlotId,
    pub species: String,
    pub age: u32,
    pub maturity_age: u32,
    pub stoloniferous: bool,
    pub colonization_probability: f64,
}

impl Plant {
    /// Plants never die of old age, so age is uncapped.
    pub fn grow(&mut self) {
        self.age = self.age.saturating_add(1);
    }

    pub fn is_mature(&self) -> bool {
        self.age >= self.maturity_age
    }

    /// Only mature stoloniferous plants roll; the roll is skipped otherwise.
    pub fn try_colonize<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        self.stoloniferous && self.is_mature() && rng.gen::<f64>() < self.colonization_probability
    }

    /// Young stoloniferous copy of this plant for a neighbouring plot.
    pub fn offshoot(&self, plot: PlotId) -> NewPlant {
        NewPlant {
            plot,
            species: self.species.clone(),
            age: 0,
            maturity_age: self.maturity_age,
            stoloniferous: true,
            colonization_probability: self.colonization_probability,
        }
    }
}

impl NewPlant {
    pub fn new(plot: PlotId, species: impl Into<String>, maturity_age: u32) -> Self {
        Self {
            plot,
            species: species.into(),
            age: 0,
            maturity_age,
            stoloniferous: false,
            colonization_probability: 0.0,
        }
    }

    pub fn stoloniferous(mut self, colonization_probability: f64) -> Self {
        self.stoloniferous = true;
        self.colonization_probability = colonization_probability;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_probability("colonization probability", self.colonization_probability)
    }
}

// ============================================================================
// Insect
// ============================================================================

pub const MAX_HEALTH: u8 = 10;
pub const DEFAULT_HEALTH: u8 = 8;
/// Consecutive hungry ticks after which an insect starves.
pub const STARVATION_LIMIT: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Sex {
    pub fn opposite(self) -> Self {
        match self {
            Sex::Male => Sex::Female,
            Sex::Female => Sex::Male,
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen::<bool>() {
            Sex::Male
        } else {
            Sex::Female
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Sex {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "M" | "MALE" => Ok(Sex::Male),
            "F" | "FEMALE" => Ok(Sex::Female),
            other => Err(SimulationError::Validation(format!("unknown sex: {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insect {
    pub id: InsectId,
    pub plot: PlotId,
    pub species: String,
    pub sex: Sex,
    pub health: u8,
    pub mobility: f64,
    pub insecticide_resistance: f64,
    /// Consecutive ticks without food.
    pub hunger: u32,
}

/// An insect that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInsect {
    pub plot: PlotId,
    pub species: String,
    pub sex: Sex,
    pub health: u8,
    pub mobility: f64,
    pub insecticide_resistance: f64,
    pub hunger: u32,
}

impl Insect {
    pub fn feed(&mut self, food_available: bool) {
        if food_available {
            self.health = self.health.saturating_add(1).min(MAX_HEALTH);
            self.hunger = 0;
        } else {
            self.health = self.health.saturating_sub(1);
            self.hunger = self.hunger.saturating_add(1);
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0 && self.hunger < STARVATION_LIMIT
    }

    pub fn try_move<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.gen::<f64>() < self.mobility
    }

    /// The whole hit is skipped when the resistance roll succeeds; otherwise
    /// damage is `floor(power * (1 - resistance))`. Returns the damage dealt.
    pub fn apply_insecticide<R: Rng + ?Sized>(&mut self, power: f64, rng: &mut R) -> u8 {
        if rng.gen::<f64>() < self.insecticide_resistance {
            return 0;
        }
        let damage = (power * (1.0 - self.insecticide_resistance)).floor().max(0.0);
        let damage = damage.min(f64::from(u8::MAX)) as u8;
        let before = self.health;
        self.health = self.health.saturating_sub(damage);
        before - self.health
    }

    pub fn offspring(&self, sex: Sex, health: u8) -> NewInsect {
        NewInsect {
            plot: self.plot,
            species: self.species.clone(),
            sex,
            health: health.min(MAX_HEALTH),
            mobility: self.mobility,
            insecticide_resistance: self.insecticide_resistance,
            hunger: 0,
        }
    }
}

impl NewInsect {
    pub fn new(plot: PlotId, species: impl Into<String>, sex: Sex) -> Self {
        Self {
            plot,
            species: species.into(),
            sex,
            health: DEFAULT_HEALTH,
            mobility: 0.0,
            insecticide_resistance: 0.0,
            hunger: 0,
        }
    }

    pub fn with_mobility(mut self, mobility: f64) -> Self {
        self.mobility = mobility;
        self
    }

    pub fn with_resistance(mut self, resistance: f64) -> Self {
        self.insecticide_resistance = resistance;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_probability("mobility", self.mobility)?;
        check_probability("insecticide resistance", self.insecticide_resistance)?;
        if self.health > MAX_HEALTH {
            return Err(SimulationError::Validation(format!(
                "health must be within 0..={MAX_HEALTH}, got {}",
                self.health
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Treatment devices
// ============================================================================

pub const DEFAULT_RADIUS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TreatmentType {
    Water,
    Insecticide,
    Fertilizer,
}

impl TreatmentType {
    pub fn as_str(self) -> &'static str {
        match self {
            TreatmentType::Water => "WATER",
            TreatmentType::Insecticide => "INSECTICIDE",
            TreatmentType::Fertilizer => "FERTILIZER",
        }
    }
}

impl fmt::Display for TreatmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TreatmentType {
    type Err = SimulationError;

    /// Accepts the English names and the legacy French ones.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WATER" | "EAU" => Ok(TreatmentType::Water),
            "INSECTICIDE" => Ok(TreatmentType::Insecticide),
            "FERTILIZER" | "ENGRAIS" => Ok(TreatmentType::Fertilizer),
            other => Err(SimulationError::Validation(format!(
                "unknown treatment type: {other:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub plot: PlotId,
    pub radius: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    pub device: DeviceId,
    pub start_tick: u64,
    pub duration: u64,
    pub treatment: TreatmentType,
}

/// A program that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProgram {
    pub device: DeviceId,
    pub start_tick: u64,
    pub duration: u64,
    pub treatment: TreatmentType,
}

impl Program {
    /// Active over the half-open window `[start, start + duration)`.
    pub fn is_active(&self, tick: u64) -> bool {
        tick >= self.start_tick && tick < self.start_tick.saturating_add(self.duration)
    }
}

/// Programs of a device that apply at `tick`, in id order.
pub fn active_programs(programs: &[Program], tick: u64) -> Vec<&Program> {
    programs.iter().filter(|p| p.is_active(tick)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn insect(health: u8, hunger: u32) -> Insect {
        Insect {
            id: InsectId(1),
            plot: PlotId(1),
            species: "Puceron".into(),
            sex: Sex::Female,
            health,
            mobility: 0.3,
            insecticide_resistance: 0.0,
            hunger,
        }
    }

    fn plant(age: u32, maturity_age: u32, stoloniferous: bool, p: f64) -> Plant {
        Plant {
            id: PlantId(1),
            plot: PlotId(1),
            species: "Menthe".into(),
            age,
            maturity_age,
            stoloniferous,
            colonization_probability: p,
        }
    }

    #[test]
    fn test_feeding_restores_and_starves() {
        let mut fed = insect(10, 3);
        fed.feed(true);
        assert_eq!(fed.health, 10);
        assert_eq!(fed.hunger, 0);

        let mut hungry = insect(0, 0);
        hungry.feed(false);
        assert_eq!(hungry.health, 0);
        assert_eq!(hungry.hunger, 1);
    }

    #[test]
    fn test_starvation_threshold() {
        let mut bug = insect(8, 4);
        assert!(bug.is_alive());
        bug.feed(false);
        assert_eq!(bug.hunger, STARVATION_LIMIT);
        assert!(!bug.is_alive());
        assert!(!insect(0, 0).is_alive());
    }

    #[test]
    fn test_insecticide_without_resistance_always_hits() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut bug = insect(8, 0);
        assert_eq!(bug.apply_insecticide(5.0, &mut rng), 5);
        assert_eq!(bug.health, 3);
        assert_eq!(bug.apply_insecticide(5.0, &mut rng), 3);
        assert_eq!(bug.health, 0);
    }

    #[test]
    fn test_insecticide_full_resistance_never_hits() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut bug = insect(8, 0);
        bug.insecticide_resistance = 1.0;
        for _ in 0..50 {
            assert_eq!(bug.apply_insecticide(5.0, &mut rng), 0);
        }
        assert_eq!(bug.health, 8);
    }

    #[test]
    fn test_insecticide_damage_is_scaled_by_resistance() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut bug = insect(8, 0);
        bug.insecticide_resistance = 0.5;
        let dealt: Vec<u8> = (0..40)
            .map(|_| {
                bug.health = 8;
                bug.apply_insecticide(5.0, &mut rng)
            })
            .collect();
        // floor(5 * 0.5) = 2 when the roll lets the hit through
        assert!(dealt.iter().all(|d| *d == 0 || *d == 2));
        assert!(dealt.contains(&0));
        assert!(dealt.contains(&2));
    }

    #[test]
    fn test_plant_maturity_and_colonization_gate() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut young = plant(3, 5, true, 1.0);
        assert!(!young.is_mature());
        assert!(!young.try_colonize(&mut rng));
        young.grow();
        young.grow();
        assert!(young.is_mature());
        assert!(young.try_colonize(&mut rng));

        let not_spreading = plant(9, 5, false, 1.0);
        assert!(!not_spreading.try_colonize(&mut rng));
    }

    #[test]
    fn test_offshoot_is_young_and_stoloniferous() {
        let parent = plant(12, 5, true, 0.4);
        let child = parent.offshoot(PlotId(9));
        assert_eq!(child.plot, PlotId(9));
        assert_eq!(child.age, 0);
        assert_eq!(child.maturity_age, 5);
        assert!(child.stoloniferous);
        assert_eq!(child.colonization_probability, 0.4);
    }

    #[test]
    fn test_program_window_boundaries() {
        let program = Program {
            id: ProgramId(1),
            device: DeviceId(1),
            start_tick: 10,
            duration: 5,
            treatment: TreatmentType::Water,
        };
        assert!(!program.is_active(9));
        assert!(program.is_active(10));
        assert!(program.is_active(14));
        assert!(!program.is_active(15));
    }

    #[test]
    fn test_treatment_type_parsing() {
        assert_eq!("water".parse::<TreatmentType>().unwrap(), TreatmentType::Water);
        assert_eq!("EAU".parse::<TreatmentType>().unwrap(), TreatmentType::Water);
        assert_eq!("Engrais".parse::<TreatmentType>().unwrap(), TreatmentType::Fertilizer);
        let err = "RAIN".parse::<TreatmentType>().unwrap_err();
        assert!(matches!(err, SimulationError::Validation(_)));
    }

    #[test]
    fn test_sex_parsing_and_opposite() {
        assert_eq!("m".parse::<Sex>().unwrap(), Sex::Male);
        assert_eq!(Sex::Male.opposite(), Sex::Female);
        assert!("X".parse::<Sex>().is_err());
    }

    #[test]
    fn test_adjacency_excludes_self() {
        let plot = Plot { id: PlotId(1), x: 2, y: 2, moisture: 50.0 };
        assert!(!plot.is_adjacent_to(2, 2));
        assert!(plot.is_adjacent_to(3, 3));
        assert!(plot.is_adjacent_to(1, 2));
        assert!(!plot.is_adjacent_to(4, 2));
    }

    proptest! {
        #[test]
        fn prop_moisture_stays_clamped(
            start in 0.0f64..=100.0,
            deltas in prop::collection::vec(-150.0f64..150.0, 0..40),
        ) {
            let mut plot = Plot { id: PlotId(1), x: 0, y: 0, moisture: start };
            for delta in deltas {
                if delta >= 0.0 {
                    plot.add_moisture(delta);
                } else {
                    plot.remove_moisture(-delta);
                }
                prop_assert!(plot.moisture >= MOISTURE_MIN && plot.moisture <= MOISTURE_MAX);
            }
        }

        #[test]
        fn prop_program_activity_matches_window(
            start in 0u64..1_000,
            duration in 0u64..100,
            tick in 0u64..1_200,
        ) {
            let program = Program {
                id: ProgramId(1),
                device: DeviceId(1),
                start_tick: start,
                duration,
                treatment: TreatmentType::Fertilizer,
            };
            prop_assert_eq!(program.is_active(tick), start <= tick && tick < start + duration);
        }
    }
}
