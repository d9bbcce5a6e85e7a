//! Tick phases - each system runs once per tick, in the order listed here.

pub mod treatment;
pub mod plants;
pub mod insects;
pub mod environment;

pub use treatment::{apply_manual_treatment, treatment_system, TreatmentResult};
pub use plants::{plant_growth_system, GrowthResult};
pub use insects::{insect_system, InsectResult};
pub use environment::evaporation_system;
