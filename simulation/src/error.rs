//! Error taxonomy for the simulation engine and its store.

use std::fmt;

/// Kind of entity referenced by a failed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Plot,
    Plant,
    Insect,
    Device,
    Program,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Plot => "plot",
            EntityKind::Plant => "plant",
            EntityKind::Insect => "insect",
            EntityKind::Device => "device",
            EntityKind::Program => "program",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// A referenced entity does not exist in the store.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// The operation conflicts with the current state of the garden.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Malformed input (treatment type, sex, export version...).
    #[error("validation error: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

impl SimulationError {
    pub fn not_found(kind: EntityKind, id: impl fmt::Display) -> Self {
        SimulationError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SimulationError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;
