//! Simulation configuration, loadable from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) gives the
//! standard 5x5 garden with the standard tick rules.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::components::DEFAULT_MOISTURE;
use crate::error::{Result, SimulationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seeds the engine RNG; `None` draws from OS entropy.
    pub seed: Option<u64>,
    pub garden: GardenConfig,
    pub rules: TickRules,
    pub runner: RunnerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GardenConfig {
    pub width: i32,
    pub height: i32,
    pub initial_moisture: f64,
    pub starter_plants: usize,
    pub starter_insects: usize,
    pub default_devices: bool,
}

/// Constants applied by the tick phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickRules {
    pub water_amount: f64,
    pub insecticide_power: f64,
    pub fertilizer_chance: f64,
    pub evaporation: f64,
    pub reproduction_chance: f64,
    /// Insects reproduce only with health strictly above this.
    pub reproduction_health_threshold: u8,
    pub newborn_health: u8,
    pub manual: ManualTreatment,
}

/// Strengths used when a treatment is triggered by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualTreatment {
    pub water_amount: f64,
    pub insecticide_power: f64,
    pub fertilizer_chance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Ticks per second used when `start` is called without a speed.
    pub default_speed: u32,
    pub max_speed: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            garden: GardenConfig::default(),
            rules: TickRules::default(),
            runner: RunnerConfig::default(),
        }
    }
}

impl Default for GardenConfig {
    fn default() -> Self {
        Self {
            width: 5,
            height: 5,
            initial_moisture: DEFAULT_MOISTURE,
            starter_plants: 10,
            starter_insects: 15,
            default_devices: true,
        }
    }
}

impl Default for TickRules {
    fn default() -> Self {
        Self {
            water_amount: 20.0,
            insecticide_power: 5.0,
            fertilizer_chance: 0.5,
            evaporation: 2.0,
            reproduction_chance: 0.3,
            reproduction_health_threshold: 7,
            newborn_health: 8,
            manual: ManualTreatment::default(),
        }
    }
}

impl Default for ManualTreatment {
    fn default() -> Self {
        Self {
            water_amount: 15.0,
            insecticide_power: 4.0,
            fertilizer_chance: 0.4,
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            default_speed: 1,
            max_speed: 100,
        }
    }
}

impl SimulationConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.garden.width <= 0 || self.garden.height <= 0 {
            return Err(SimulationError::Validation(format!(
                "garden must be at least 1x1, got {}x{}",
                self.garden.width, self.garden.height
            )));
        }
        for (name, chance) in [
            ("fertilizer_chance", self.rules.fertilizer_chance),
            ("reproduction_chance", self.rules.reproduction_chance),
            ("manual.fertilizer_chance", self.rules.manual.fertilizer_chance),
        ] {
            crate::components::check_probability(name, chance)?;
        }
        for (name, amount) in [
            ("water_amount", self.rules.water_amount),
            ("insecticide_power", self.rules.insecticide_power),
            ("evaporation", self.rules.evaporation),
            ("manual.water_amount", self.rules.manual.water_amount),
            ("manual.insecticide_power", self.rules.manual.insecticide_power),
            ("initial_moisture", self.garden.initial_moisture),
        ] {
            if !amount.is_finite() || amount < 0.0 {
                return Err(SimulationError::Validation(format!(
                    "{name} must be a finite non-negative number, got {amount}"
                )));
            }
        }
        if self.runner.default_speed == 0 || self.runner.max_speed == 0 {
            return Err(SimulationError::Validation("speeds must be positive".into()));
        }
        Ok(())
    }
}
