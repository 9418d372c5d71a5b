//! Where the CLI keeps its state: settings, calibration snapshot, history
//! files and correction tables.

use std::fs;
use std::path::{Path, PathBuf};

use tankgauge_config::Settings;
use tankgauge_gauging::{CalibrationStore, CorrectionConfig, GaugeError, Vessel, VesselTank};
use tankgauge_recon::JsonFileHistory;

use crate::exit_codes::{EXIT_GAUGE_NOT_FOUND, EXIT_STORE_CORRUPT, EXIT_TABLES_INVALID};
use crate::CliError;

pub struct Workspace {
    pub settings: Settings,
}

impl Workspace {
    /// Settings from `config` (or the default location), with command-line
    /// overrides applied on top.
    pub fn open(config: Option<PathBuf>, data_dir: Option<PathBuf>, tables: Option<PathBuf>) -> Self {
        let mut settings = match config {
            Some(path) => Settings::load_from(&path),
            None => Settings::load(),
        };
        if data_dir.is_some() {
            settings.data_dir = data_dir;
        }
        if tables.is_some() {
            settings.tables_path = tables;
        }
        Self { settings }
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.settings.snapshot_path()
    }

    /// Current calibration snapshot. A missing file is an empty store.
    pub fn load_store(&self) -> Result<CalibrationStore, CliError> {
        let path = self.snapshot_path();
        if !path.exists() {
            tracing::info!("no snapshot at {}, starting empty", path.display());
            return Ok(CalibrationStore::default());
        }
        let contents = fs::read_to_string(&path)
            .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
        CalibrationStore::from_json(&contents).map_err(|e| {
            CliError::new(EXIT_STORE_CORRUPT, format!("{}: {e}", path.display()))
                .with_hint("restore the file from a backup or remove it to start over")
        })
    }

    /// Write the snapshot next to its final path, then rename over it.
    pub fn save_store(&self, store: &CalibrationStore) -> Result<(), CliError> {
        let path = self.snapshot_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CliError::io(format!("cannot create {}: {e}", parent.display())))?;
        }
        let json = store.to_json().map_err(|e| CliError::gauge(&e))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| CliError::io(format!("cannot write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &path).map_err(|e| CliError::io(format!("cannot replace {}: {e}", path.display())))?;
        tracing::info!("saved snapshot to {}", path.display());
        Ok(())
    }

    pub fn history(&self) -> JsonFileHistory {
        JsonFileHistory::new(self.settings.history_dir(), self.settings.history_key_prefix.clone())
    }

    /// Correction tables from the configured file, or the built-in defaults.
    pub fn load_tables(&self) -> Result<CorrectionConfig, CliError> {
        match self.settings.tables_path {
            Some(ref path) => load_tables_file(path),
            None => Ok(CorrectionConfig::default()),
        }
    }
}

pub fn load_tables_file(path: &Path) -> Result<CorrectionConfig, CliError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
    CorrectionConfig::from_toml(&contents)
        .map_err(|e| CliError::new(EXIT_TABLES_INVALID, format!("{}: {e}", path.display())))
}

pub fn find_tank<'a>(store: &'a CalibrationStore, external_id: &str) -> Result<(&'a Vessel, &'a VesselTank), CliError> {
    store.find_tank_by_external_id(external_id).ok_or_else(|| {
        CliError::gauge(&GaugeError::TankNotFound(external_id.to_string()))
            .with_hint("import its TANQUE and CALIBRACAO records first")
    })
}

pub fn find_vessel<'a>(store: &'a CalibrationStore, external_id: &str) -> Result<&'a Vessel, CliError> {
    store.find_vessel_by_external_id(external_id).ok_or_else(|| {
        CliError::new(EXIT_GAUGE_NOT_FOUND, format!("vessel '{external_id}' not found"))
            .with_hint("run `tankgauge vessels` to list known vessels")
    })
}
