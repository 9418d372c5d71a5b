use std::fmt;

use crate::model::Trim;

#[derive(Debug, Clone, PartialEq)]
pub enum GaugeError {
    /// The tank has no calibration points at the requested trim.
    NoCalibrationForTrim { trim: Trim, available: Vec<Trim> },
    /// Requested height lies outside the calibrated range for the trim.
    HeightOutOfRange { trim: Trim, height: f64, min: f64, max: f64 },
    /// A reading is not a usable number (NaN, negative volume, zero density).
    InvalidReading { field: &'static str, value: f64 },
    /// A required field of an upsert is empty.
    MissingField(&'static str),
    /// No vessel with this external id.
    VesselNotFound(String),
    /// No tank with this external id in any vessel.
    TankNotFound(String),
    /// The tank external id is already registered under another vessel.
    TankOwnedByOtherVessel { tank: String, vessel: String },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Correction table validation error.
    ConfigValidation(String),
    /// Calibration store snapshot could not be (de)serialized.
    Snapshot(String),
}

impl fmt::Display for GaugeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCalibrationForTrim { trim, available } => {
                if available.is_empty() {
                    write!(f, "no calibration for trim {trim} (tank has no calibration points)")
                } else {
                    let list: Vec<String> = available.iter().map(|t| t.to_string()).collect();
                    write!(f, "no calibration for trim {trim} (calibrated: {})", list.join(", "))
                }
            }
            Self::HeightOutOfRange { trim, height, min, max } => {
                write!(f, "height {height} out of calibrated range [{min}, {max}] at trim {trim}")
            }
            Self::InvalidReading { field, value } => {
                write!(f, "invalid reading for {field}: {value}")
            }
            Self::MissingField(field) => write!(f, "missing required field '{field}'"),
            Self::VesselNotFound(ext) => write!(f, "vessel '{ext}' not found"),
            Self::TankNotFound(ext) => write!(f, "tank '{ext}' not found"),
            Self::TankOwnedByOtherVessel { tank, vessel } => {
                write!(f, "tank '{tank}' already belongs to vessel '{vessel}'")
            }
            Self::ConfigParse(msg) => write!(f, "correction tables parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "correction tables validation error: {msg}"),
            Self::Snapshot(msg) => write!(f, "calibration snapshot error: {msg}"),
        }
    }
}

impl std::error::Error for GaugeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_trim_and_bounds() {
        let err = GaugeError::HeightOutOfRange {
            trim: Trim(0),
            height: 150.0,
            min: 0.0,
            max: 100.0,
        };
        assert_eq!(
            err.to_string(),
            "height 150 out of calibrated range [0, 100] at trim 0"
        );

        let err = GaugeError::NoCalibrationForTrim {
            trim: Trim(25),
            available: vec![Trim(-25), Trim(0)],
        };
        assert_eq!(
            err.to_string(),
            "no calibration for trim +25 (calibrated: -25, 0)"
        );
    }
}
