//! Calibration-curve lookup: (trim, height) → ambient volume.
//!
//! Trims are discrete calibration conditions and must match exactly. Heights
//! are interpolated linearly between the two surrounding calibrated heights.
//! Readings outside the calibrated range are rejected; the curve is never
//! extrapolated.

use ordered_float::OrderedFloat;

use crate::error::GaugeError;
use crate::model::{CalibrationPoint, Trim, VesselTank};

/// Calibrated trims present in the points, ascending.
pub fn available_trims(points: &[CalibrationPoint]) -> Vec<Trim> {
    let mut trims: Vec<Trim> = points.iter().map(|p| p.trim).collect();
    trims.sort();
    trims.dedup();
    trims
}

/// (height, volume) pairs for one trim, sorted by height.
pub fn curve_for_trim(points: &[CalibrationPoint], trim: Trim) -> Vec<(f64, f64)> {
    let mut curve: Vec<(f64, f64)> = points
        .iter()
        .filter(|p| p.trim == trim)
        .map(|p| (p.height, p.volume))
        .collect();
    curve.sort_by_key(|(h, _)| OrderedFloat(*h));
    curve
}

/// Ambient volume for a tank at the given trim and liquid height.
pub fn volume_at(tank: &VesselTank, trim: Trim, height: f64) -> Result<f64, GaugeError> {
    volume_from_points(&tank.calibration, trim, height)
}

pub fn volume_from_points(
    points: &[CalibrationPoint],
    trim: Trim,
    height: f64,
) -> Result<f64, GaugeError> {
    if !height.is_finite() {
        return Err(GaugeError::InvalidReading { field: "height", value: height });
    }

    let curve = curve_for_trim(points, trim);
    let (Some(first), Some(last)) = (curve.first(), curve.last()) else {
        return Err(GaugeError::NoCalibrationForTrim {
            trim,
            available: available_trims(points),
        });
    };

    if height < first.0 || height > last.0 {
        return Err(GaugeError::HeightOutOfRange {
            trim,
            height,
            min: first.0,
            max: last.0,
        });
    }

    // First calibrated height >= requested height.
    let upper = curve.partition_point(|(h, _)| *h < height);
    let (h1, v1) = curve[upper];
    if h1 == height || upper == 0 {
        return Ok(v1);
    }
    let (h0, v0) = curve[upper - 1];
    Ok(v0 + (v1 - v0) * (height - h0) / (h1 - h0))
}
