//! Command surface used by the CLI: one function per operation, each taking
//! the shared [`AppState`](crate::state::AppState).

pub mod config;
pub mod devices;
pub mod insects;
pub mod plants;
pub mod plots;
pub mod simulation;
