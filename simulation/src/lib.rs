//! Potager Simulation Engine
//!
//! Grid garden simulation: plots hold moisture, plants, insects and
//! treatment devices; a clock drives a fixed pipeline of systems one tick at
//! a time and publishes a snapshot after each tick.

pub mod clock;
pub mod components;
pub mod config;
pub mod error;
pub mod garden;
pub mod persistence;
pub mod publisher;
pub mod snapshot;
pub mod store;
pub mod systems;
pub mod world;

pub use clock::{period_for_speed, ClockState, SimulationClock};
pub use components::*;
pub use config::{GardenConfig, ManualTreatment, RunnerConfig, SimulationConfig, TickRules};
pub use error::{EntityKind, Result, SimulationError};
pub use persistence::{ExportData, ImportResult, LoadFileResult, SaveStats};
pub use publisher::{ChannelPublisher, FanoutPublisher, LogPublisher, NullPublisher, StatePublisher};
pub use snapshot::{MoistureCategory, WorldStateSnapshot};
pub use store::{GridStore, HecsGridStore, StoreContents};
pub use world::{SimulationWorld, TickReport};
