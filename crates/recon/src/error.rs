use std::fmt;

use tankgauge_gauging::GaugeError;

use crate::model::RecordTag;

/// Batch-level failure: nothing could be split out of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// Input is empty or whitespace only.
    EmptyInput,
    /// Input has content but no record tag anywhere.
    NoRecords,
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "import input is empty"),
            Self::NoRecords => write!(
                f,
                "no records found (expected lines starting with BALSA;, TANQUE;, CALIBRACAO; or MEDICAO;)"
            ),
        }
    }
}

impl std::error::Error for ImportError {}

/// A single record that could not be applied. Never aborts the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Required field missing or malformed.
    Validation { line: usize, tag: Option<RecordTag>, message: String },
    /// Parent or sibling entity cannot be resolved by external id.
    Reference { line: usize, tag: Option<RecordTag>, message: String },
    /// Reading outside the calibration (trim not calibrated, height out of range).
    Range { line: usize, tag: Option<RecordTag>, message: String },
}

impl RecordError {
    pub fn validation(line: usize, tag: RecordTag, message: impl Into<String>) -> Self {
        Self::Validation { line, tag: Some(tag), message: message.into() }
    }

    pub fn reference(line: usize, tag: RecordTag, message: impl Into<String>) -> Self {
        Self::Reference { line, tag: Some(tag), message: message.into() }
    }

    /// Classify an engine error raised while applying a record.
    pub fn from_gauge(line: usize, tag: RecordTag, err: &GaugeError) -> Self {
        let message = err.to_string();
        let tag = Some(tag);
        match err {
            GaugeError::VesselNotFound(_)
            | GaugeError::TankNotFound(_)
            | GaugeError::TankOwnedByOtherVessel { .. } => Self::Reference { line, tag, message },
            GaugeError::NoCalibrationForTrim { .. }
            | GaugeError::HeightOutOfRange { .. }
            | GaugeError::InvalidReading { .. } => Self::Range { line, tag, message },
            GaugeError::MissingField(_)
            | GaugeError::ConfigParse(_)
            | GaugeError::ConfigValidation(_)
            | GaugeError::Snapshot(_) => Self::Validation { line, tag, message },
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Self::Validation { line, .. } | Self::Reference { line, .. } | Self::Range { line, .. } => *line,
        }
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (line, tag, message) = match self {
            Self::Validation { line, tag, message }
            | Self::Reference { line, tag, message }
            | Self::Range { line, tag, message } => (line, tag, message),
        };
        match tag {
            Some(tag) => write!(f, "line {line} ({tag}): {message}"),
            None => write!(f, "line {line}: {message}"),
        }
    }
}

impl std::error::Error for RecordError {}

/// Measurement history could not be read or written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    Io(String),
    Serialize(String),
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "history IO error: {msg}"),
            Self::Serialize(msg) => write!(f, "history serialization error: {msg}"),
        }
    }
}

impl std::error::Error for HistoryError {}
