// Application settings
// Loaded from ~/.config/tankgauge/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "tankgauge";
const DEFAULT_HISTORY_PREFIX: &str = "measurement_history";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where the calibration snapshot and history files live.
    /// None = platform data dir.
    #[serde(rename = "data.dir")]
    pub data_dir: Option<PathBuf>,

    #[serde(rename = "history.keyPrefix")]
    pub history_key_prefix: String,

    /// Correction tables TOML. None = built-in defaults.
    #[serde(rename = "tables.path")]
    pub tables_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            history_key_prefix: DEFAULT_HISTORY_PREFIX.to_string(),
            tables_path: None,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("settings.json")
    }

    /// Load settings from disk, falling back to defaults.
    /// Writes a commented default file on first run.
    pub fn load() -> Self {
        Self::load_or_create(&Self::config_path())
    }

    fn load_or_create(path: &Path) -> Self {
        if !path.exists() {
            let settings = Self::default();
            settings.create_default_file(path);
            return settings;
        }
        Self::load_from(path)
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => {
                // Strip comments (lines starting with //)
                let cleaned: String = contents
                    .lines()
                    .filter(|line| !line.trim().starts_with("//"))
                    .collect::<Vec<_>>()
                    .join("\n");

                match serde_json::from_str(&cleaned) {
                    Ok(settings) => settings,
                    Err(e) => {
                        log::warn!("error parsing {}: {e}; using default settings", path.display());
                        Self::default()
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("{} not found; using default settings", path.display());
                Self::default()
            }
            Err(e) => {
                log::warn!("error reading {}: {e}; using default settings", path.display());
                Self::default()
            }
        }
    }

    fn create_default_file(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("error creating config directory: {e}");
                return;
            }
        }

        let default_config = r#"{
    // Calibration snapshot and measurement history directory
    // null = platform data directory
    "data.dir": null,

    // History files are named <prefix>_<vesselId>.json
    "history.keyPrefix": "measurement_history",

    // Correction tables (TOML); null = built-in defaults
    "tables.path": null
}
"#;

        if let Err(e) = fs::write(path, default_config) {
            log::warn!("error writing default settings.json: {e}");
        }
    }

    // -- derived paths -------------------------------------------------------

    pub fn effective_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
        })
    }

    /// JSON calibration snapshot.
    pub fn snapshot_path(&self) -> PathBuf {
        self.effective_data_dir().join("calibration.json")
    }

    pub fn history_dir(&self) -> PathBuf {
        self.effective_data_dir().join("history")
    }
}
