//! Persistence module for export/import of simulation state
//!
//! The whole store plus the tick counter is wrapped in [`ExportData`]. JSON
//! is used for string export/import, bincode for files.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, SimulationError};
use crate::store::StoreContents;
use crate::world::SimulationWorld;

pub const EXPORT_VERSION: u8 = 1;

/// Complete world state for persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportData {
    pub version: u8,
    pub tick: u64,
    pub saved_at: DateTime<Utc>,
    pub contents: StoreContents,
}

/// Counts of what an import or load brought back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    pub tick: u64,
    pub plots: usize,
    pub plants: usize,
    pub insects: usize,
    pub devices: usize,
    pub programs: usize,
}

impl ImportResult {
    fn from_data(data: &ExportData) -> Self {
        Self {
            tick: data.tick,
            plots: data.contents.plots.len(),
            plants: data.contents.plants.len(),
            insects: data.contents.insects.len(),
            devices: data.contents.devices.len(),
            programs: data.contents.programs.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveStats {
    pub bytes: u64,
    pub entities: usize,
    pub tick: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadFileResult {
    pub imported: ImportResult,
    pub saved_at: DateTime<Utc>,
}

impl SimulationWorld {
    pub fn export_data(&self) -> ExportData {
        ExportData {
            version: EXPORT_VERSION,
            tick: self.current_tick(),
            saved_at: Utc::now(),
            contents: self.store().contents(),
        }
    }

    /// Export entire world state to JSON string
    pub fn export_world(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.export_data())?)
    }

    /// Import world state from JSON string, replacing current state
    pub fn import_world(&mut self, json: &str) -> Result<ImportResult> {
        let data: ExportData = serde_json::from_str(json)?;
        self.apply_export(data)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<SaveStats> {
        let path = path.as_ref();
        let data = self.export_data();
        let entities = data.contents.plots.len()
            + data.contents.plants.len()
            + data.contents.insects.len()
            + data.contents.devices.len()
            + data.contents.programs.len();

        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut writer, &data)?;
        let file = writer.into_inner().map_err(|e| SimulationError::Io(e.into_error()))?;
        let bytes = file.metadata()?.len();

        info!(path = %path.display(), bytes, entities, tick = data.tick, "world saved");
        Ok(SaveStats {
            bytes,
            entities,
            tick: data.tick,
        })
    }

    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<LoadFileResult> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let data: ExportData = bincode::deserialize_from(reader)?;
        let saved_at = data.saved_at;
        let imported = self.apply_export(data)?;

        info!(path = %path.display(), tick = imported.tick, %saved_at, "world loaded");
        Ok(LoadFileResult { imported, saved_at })
    }

    fn apply_export(&mut self, data: ExportData) -> Result<ImportResult> {
        if data.version != EXPORT_VERSION {
            return Err(SimulationError::Validation(format!(
                "unsupported export version: {}",
                data.version
            )));
        }
        let result = ImportResult::from_data(&data);
        self.store_mut().restore(data.contents)?;
        self.set_tick(data.tick);
        Ok(result)
    }
}
