use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;
use tankgauge_gauging::{
    CalibrationStore, CalibrationUpsert, MeasurementLog, OperationType, TankUpsert, Trim, VesselId,
    VesselUpsert,
};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RecordTag {
    Balsa,
    Tanque,
    Calibracao,
    Medicao,
}

impl RecordTag {
    /// Match a tag keyword, accents and case ignored.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.trim().to_uppercase().as_str() {
            "BALSA" => Some(Self::Balsa),
            "TANQUE" => Some(Self::Tanque),
            "CALIBRACAO" | "CALIBRAÇÃO" => Some(Self::Calibracao),
            "MEDICAO" | "MEDIÇÃO" => Some(Self::Medicao),
            _ => None,
        }
    }
}

impl fmt::Display for RecordTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Balsa => write!(f, "BALSA"),
            Self::Tanque => write!(f, "TANQUE"),
            Self::Calibracao => write!(f, "CALIBRACAO"),
            Self::Medicao => write!(f, "MEDICAO"),
        }
    }
}

/// One record as cut out of the raw text: tag plus the text after `TAG;`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub line: usize,
    pub tag: RecordTag,
    pub body: String,
}

/// One `MEDICAO` line, before tank resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementLine {
    pub vessel_external_id: String,
    pub tank_external_id: String,
    pub timestamp: NaiveDateTime,
    pub operation: OperationType,
    pub trim: Trim,
    pub height: f64,
    /// `None` when the volume column is blank; resolved from the calibration curve.
    pub volume: Option<f64>,
    pub product: String,
    pub origin: String,
    pub destination: String,
    pub operator: String,
}

/// A typed record. One handler per variant.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportRecord {
    Vessel(VesselUpsert),
    Tank(TankUpsert),
    Calibration(CalibrationUpsert),
    Measurement(MeasurementLine),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    pub line: usize,
    pub record: ImportRecord,
}

// ---------------------------------------------------------------------------
// Measurement grouping
// ---------------------------------------------------------------------------

/// Group key = (vessel, timestamp, operation, operator).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeasurementKey {
    pub vessel_external_id: String,
    pub timestamp: NaiveDateTime,
    pub operation: String,
    pub operator: String,
}

/// A pending reading inside a group, with the line it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReading {
    pub line: usize,
    pub tank_external_id: String,
    pub trim: Trim,
    pub height: f64,
    pub volume: Option<f64>,
}

/// `MEDICAO` lines sharing a [`MeasurementKey`], collected in pass 1.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementGroup {
    pub key: MeasurementKey,
    pub first_line: usize,
    pub operation: OperationType,
    pub product: String,
    pub origin: String,
    pub destination: String,
    /// Sum of the volumes given explicitly in the text.
    pub total_volume: f64,
    pub readings: Vec<PendingReading>,
}

// ---------------------------------------------------------------------------
// Outcome + Summary
// ---------------------------------------------------------------------------

/// What happened to one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    VesselCreated,
    VesselUpdated,
    TankCreated,
    TankUpdated,
    PointAdded,
    PointUpdated,
    MeasurementLogged,
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub vessels_created: usize,
    pub vessels_updated: usize,
    pub tanks_created: usize,
    pub tanks_updated: usize,
    pub points_added: usize,
    pub points_updated: usize,
    pub measurement_logs: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ImportSummary {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Result of an import: the new snapshot, the logs produced per vessel and
/// the change summary. The input snapshot is never modified.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub store: CalibrationStore,
    pub logs: BTreeMap<VesselId, Vec<MeasurementLog>>,
    pub summary: ImportSummary,
}
