use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Label used when a log entry points at a tank that no longer exists.
pub const UNKNOWN_TANK: &str = "unknown tank";

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VesselId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TankId(pub String);

impl VesselId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl TankId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for VesselId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Trim
// ---------------------------------------------------------------------------

/// Discrete calibration trim condition (`+50`, `+25`, `0`, `-25`, `-50`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trim(pub i32);

impl fmt::Display for Trim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 > 0 {
            write!(f, "+{}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl FromStr for Trim {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s.strip_prefix('+').unwrap_or(s);
        if digits.len() != s.len() && digits.starts_with(['+', '-']) {
            return Err(format!("invalid trim '{s}'"));
        }
        digits
            .parse::<i32>()
            .map(Trim)
            .map_err(|_| format!("invalid trim '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// Cadastral data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub trim: Trim,
    pub height: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselTank {
    pub id: TankId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub tank_name: String,
    pub max_calibrated_height: f64,
    pub max_volume: f64,
    #[serde(default)]
    pub calibration: Vec<CalibrationPoint>,
}

impl VesselTank {
    pub fn new(tank_name: impl Into<String>) -> Self {
        Self {
            id: TankId::generate(),
            external_id: None,
            tank_name: tank_name.into(),
            max_calibrated_height: 0.0,
            max_volume: 0.0,
            calibration: Vec::new(),
        }
    }

    /// Calibration point at exactly (trim, height).
    pub fn find_point(&self, trim: Trim, height: f64) -> Option<&CalibrationPoint> {
        self.calibration
            .iter()
            .find(|p| p.trim == trim && p.height == height)
    }

    /// Heights at which volume decreases relative to the previous calibrated
    /// height of the same trim.
    pub fn curve_warnings(&self) -> Vec<String> {
        let mut trims: Vec<Trim> = self.calibration.iter().map(|p| p.trim).collect();
        trims.sort();
        trims.dedup();

        let mut warnings = Vec::new();
        for trim in trims {
            let curve = crate::interpolate::curve_for_trim(&self.calibration, trim);
            for pair in curve.windows(2) {
                if pair[1].1 < pair[0].1 {
                    warnings.push(format!(
                        "tank '{}': volume decreases at trim {trim} between height {} ({}) and {} ({})",
                        self.tank_name, pair[0].0, pair[0].1, pair[1].0, pair[1].1
                    ));
                }
            }
        }
        warnings
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vessel {
    pub id: VesselId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub executor: String,
    #[serde(default)]
    pub certificate_number: String,
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub total_theoretical_capacity: f64,
    #[serde(default)]
    pub tanks: Vec<VesselTank>,
}

impl Vessel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: VesselId::generate(),
            external_id: None,
            name: name.into(),
            executor: String::new(),
            certificate_number: String::new(),
            issue_date: None,
            expiry_date: None,
            notes: String::new(),
            total_theoretical_capacity: 0.0,
            tanks: Vec::new(),
        }
    }

    pub fn find_tank(&self, id: &TankId) -> Option<&VesselTank> {
        self.tanks.iter().find(|t| &t.id == id)
    }

    /// Sum of the tanks' maximum volumes.
    pub fn theoretical_capacity(&self) -> f64 {
        self.tanks.iter().map(|t| t.max_volume).sum()
    }
}

// ---------------------------------------------------------------------------
// Measurement history
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Loading,
    Unloading,
    Transfer,
    Inspection,
    Other(String),
}

impl OperationType {
    /// Map a free-text operation label (Portuguese or English) to a type.
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_lowercase();
        match normalized.as_str() {
            "carga" | "carregamento" | "loading" | "load" => Self::Loading,
            "descarga" | "descarregamento" | "unloading" | "unload" => Self::Unloading,
            "transbordo" | "transferencia" | "transferência" | "transfer" => Self::Transfer,
            "vistoria" | "inspecao" | "inspeção" | "inspection" => Self::Inspection,
            _ => Self::Other(label.trim().to_string()),
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => write!(f, "loading"),
            Self::Unloading => write!(f, "unloading"),
            Self::Transfer => write!(f, "transfer"),
            Self::Inspection => write!(f, "inspection"),
            Self::Other(label) => write!(f, "{label}"),
        }
    }
}

/// One tank's reading inside a gauging event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TankReading {
    /// Internal tank id; `None` when the tank could not be resolved.
    pub tank_id: Option<TankId>,
    pub tank_name: String,
    pub trim: Trim,
    pub height: f64,
    pub calculated_volume: f64,
}

/// A completed gauging event. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementLog {
    pub id: String,
    pub vessel_id: VesselId,
    pub timestamp: NaiveDateTime,
    pub operation: OperationType,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub operator: String,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
    pub total_volume: f64,
    pub measurements: Vec<TankReading>,
}
