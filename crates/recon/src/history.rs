//! Per-vessel measurement history.
//!
//! History is append-only: new logs are merged into what was persisted and
//! the combined list is kept newest-first. Entries are never edited or
//! removed here. Two writers on the same vessel key are last-writer-wins.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use tankgauge_gauging::{MeasurementLog, VesselId};

use crate::error::HistoryError;

pub const DEFAULT_HISTORY_PREFIX: &str = "measurement_history";

/// Storage key for a vessel's history: `"<prefix>_<vesselId>"`.
pub fn history_key(prefix: &str, vessel_id: &VesselId) -> String {
    format!("{prefix}_{vessel_id}")
}

pub trait HistoryRepository {
    fn get(&self, vessel_id: &VesselId) -> Result<Vec<MeasurementLog>, HistoryError>;
    fn put(&mut self, vessel_id: &VesselId, logs: &[MeasurementLog]) -> Result<(), HistoryError>;
}

/// New logs followed by the existing ones, stably sorted newest first.
pub fn merge_history(existing: Vec<MeasurementLog>, new: Vec<MeasurementLog>) -> Vec<MeasurementLog> {
    let mut merged = new;
    merged.extend(existing);
    merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    merged
}

/// Merge `new` into the vessel's stored history and write it back.
pub fn append_logs<R: HistoryRepository + ?Sized>(
    repository: &mut R,
    vessel_id: &VesselId,
    new: Vec<MeasurementLog>,
) -> Result<Vec<MeasurementLog>, HistoryError> {
    let existing = repository.get(vessel_id)?;
    let merged = merge_history(existing, new);
    repository.put(vessel_id, &merged)?;
    Ok(merged)
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct InMemoryHistory {
    prefix: String,
    entries: HashMap<String, Vec<MeasurementLog>>,
}

impl InMemoryHistory {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), entries: HashMap::new() }
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_PREFIX)
    }
}

impl HistoryRepository for InMemoryHistory {
    fn get(&self, vessel_id: &VesselId) -> Result<Vec<MeasurementLog>, HistoryError> {
        Ok(self
            .entries
            .get(&history_key(&self.prefix, vessel_id))
            .cloned()
            .unwrap_or_default())
    }

    fn put(&mut self, vessel_id: &VesselId, logs: &[MeasurementLog]) -> Result<(), HistoryError> {
        self.entries
            .insert(history_key(&self.prefix, vessel_id), logs.to_vec());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JSON files
// ---------------------------------------------------------------------------

/// One `<key>.json` file per vessel inside `dir`.
#[derive(Debug, Clone)]
pub struct JsonFileHistory {
    dir: PathBuf,
    prefix: String,
}

impl JsonFileHistory {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self { dir: dir.into(), prefix: prefix.into() }
    }

    pub fn path_for(&self, vessel_id: &VesselId) -> PathBuf {
        self.dir
            .join(format!("{}.json", history_key(&self.prefix, vessel_id)))
    }
}

impl HistoryRepository for JsonFileHistory {
    fn get(&self, vessel_id: &VesselId) -> Result<Vec<MeasurementLog>, HistoryError> {
        let path = self.path_for(vessel_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&path)
            .map_err(|e| HistoryError::Io(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&contents)
            .map_err(|e| HistoryError::Serialize(format!("{}: {e}", path.display())))
    }

    fn put(&mut self, vessel_id: &VesselId, logs: &[MeasurementLog]) -> Result<(), HistoryError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| HistoryError::Io(format!("cannot create {}: {e}", self.dir.display())))?;
        let path = self.path_for(vessel_id);
        let json = serde_json::to_string_pretty(logs).map_err(|e| HistoryError::Serialize(e.to_string()))?;
        // written beside the target, then renamed over it
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| HistoryError::Io(format!("cannot write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &path)
            .map_err(|e| HistoryError::Io(format!("cannot replace {}: {e}", path.display())))
    }
}
