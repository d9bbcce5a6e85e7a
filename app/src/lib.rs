//! Controlling layer of the potager simulation: shared application state
//! and the command surface (simulation control, plot/plant/insect/device
//! management, configuration).

pub mod commands;
pub mod state;

pub use state::AppState;
