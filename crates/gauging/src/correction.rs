//! Density/temperature correction of ambient volumes.
//!
//! Observed density at the sample temperature is brought to the reference
//! temperature (r20). The tank's liquid density at tank temperature against
//! r20 gives the volume correction factor (fcv, mass is conserved), so
//! `v20 = vamb × fcv`. Alcohol content (INPM, % mass) is read from the
//! alcoholometric table at r20, and both r20 and INPM are checked against
//! the product's compliance bands.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{AlcoholometricPoint, CorrectionConfig, ProductSpec};
use crate::error::GaugeError;

pub const METRIC_DENSITY: &str = "ρ@20";
pub const METRIC_INPM: &str = "INPM";

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    AnhydrousEthanol,
    HydratedEthanol,
    /// Dry/bulk cargo: no density correction.
    Bulk,
}

impl ProductKind {
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_lowercase();
        if normalized.is_empty() {
            return Self::Bulk;
        }
        let words: Vec<&str> = normalized
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let has = |needles: &[&str]| words.iter().any(|w| needles.contains(w));

        if has(&["eac", "aeac", "anidro", "anhydrous"]) {
            Self::AnhydrousEthanol
        } else if has(&["ehc", "aehc", "hidratado", "hydrated"]) {
            Self::HydratedEthanol
        } else {
            Self::Bulk
        }
    }

    pub fn is_liquid(&self) -> bool {
        !matches!(self, Self::Bulk)
    }

    fn spec<'a>(&self, config: &'a CorrectionConfig) -> Option<&'a ProductSpec> {
        match self {
            Self::AnhydrousEthanol => Some(&config.products.anhydrous),
            Self::HydratedEthanol => Some(&config.products.hydrated),
            Self::Bulk => None,
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnhydrousEthanol => write!(f, "anhydrous ethanol"),
            Self::HydratedEthanol => write!(f, "hydrated ethanol"),
            Self::Bulk => write!(f, "bulk"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionInput {
    pub product: ProductKind,
    /// Ambient volume read from the calibration curve.
    pub vamb: f64,
    /// Observed density at the sample temperature (kg/m³).
    pub rho: f64,
    /// Sample temperature (°C).
    pub ta: f64,
    /// Tank temperature (°C); the sample temperature is used when absent.
    pub tt: Option<f64>,
    pub empty: bool,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ComplianceStatus {
    #[default]
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "FORA")]
    Fora,
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Ok => write!(f, "OK"),
            Self::Fora => write!(f, "FORA"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CorrectionResult {
    pub r20: f64,
    pub fcv: f64,
    pub inpm: f64,
    pub v20: f64,
    pub status: ComplianceStatus,
    pub messages: Vec<String>,
}

impl CorrectionResult {
    /// Presentation rounding: r20/inpm 1 decimal, fcv 4, v20 3.
    pub fn rounded(&self) -> Self {
        Self {
            r20: round_to(self.r20, 1),
            fcv: round_to(self.fcv, 4),
            inpm: round_to(self.inpm, 1),
            v20: round_to(self.v20, 3),
            status: self.status,
            messages: self.messages.clone(),
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub fn correct(input: &CorrectionInput, config: &CorrectionConfig) -> Result<CorrectionResult, GaugeError> {
    if input.empty {
        return Ok(CorrectionResult::default());
    }

    if !input.vamb.is_finite() || input.vamb < 0.0 {
        return Err(GaugeError::InvalidReading { field: "vamb", value: input.vamb });
    }

    let Some(spec) = input.product.spec(config) else {
        return Ok(CorrectionResult {
            r20: 0.0,
            fcv: 1.0,
            inpm: 0.0,
            v20: input.vamb,
            status: ComplianceStatus::Ok,
            messages: Vec::new(),
        });
    };

    if !input.rho.is_finite() || input.rho <= 0.0 {
        return Err(GaugeError::InvalidReading { field: "rho", value: input.rho });
    }
    if !input.ta.is_finite() {
        return Err(GaugeError::InvalidReading { field: "ta", value: input.ta });
    }
    let tank_temperature = input.tt.unwrap_or(input.ta);
    if !tank_temperature.is_finite() {
        return Err(GaugeError::InvalidReading { field: "tt", value: tank_temperature });
    }

    let reference = config.reference_temperature;
    let r20 = density_at_reference(input.rho, input.ta, reference, spec.thermal_coefficient);
    let rho_tank = r20 - spec.thermal_coefficient * (tank_temperature - reference);
    let fcv = rho_tank / r20;
    let v20 = input.vamb * fcv;
    let inpm = inpm_from_density(r20, &config.alcoholometric);

    let messages = compliance_messages(r20, inpm, spec);
    let status = if messages.is_empty() {
        ComplianceStatus::Ok
    } else {
        ComplianceStatus::Fora
    };

    Ok(CorrectionResult { r20, fcv, inpm, v20, status, messages })
}

/// Density observed at `temperature` brought to the reference temperature.
pub fn density_at_reference(rho: f64, temperature: f64, reference: f64, coefficient: f64) -> f64 {
    rho + coefficient * (temperature - reference)
}

/// Alcohol content (% mass) for a reference density, interpolated linearly
/// in a table sorted by density. Densities beyond the table clamp to its ends.
pub fn inpm_from_density(r20: f64, table: &[AlcoholometricPoint]) -> f64 {
    let (Some(first), Some(last)) = (table.first(), table.last()) else {
        return 0.0;
    };
    if r20 <= first.density {
        return first.inpm;
    }
    if r20 >= last.density {
        return last.inpm;
    }
    let upper = table.partition_point(|p| p.density < r20);
    let hi = table[upper];
    let lo = table[upper - 1];
    lo.inpm + (hi.inpm - lo.inpm) * (r20 - lo.density) / (hi.density - lo.density)
}

fn compliance_messages(r20: f64, inpm: f64, spec: &ProductSpec) -> Vec<String> {
    let mut messages = Vec::new();
    if let Some(msg) = band_violation(METRIC_DENSITY, r20, spec.density_min, spec.density_max, "kg/m³") {
        messages.push(msg);
    }
    if let Some(msg) = band_violation(METRIC_INPM, inpm, spec.inpm_min, spec.inpm_max, "%") {
        messages.push(msg);
    }
    messages
}

fn band_violation(metric: &str, value: f64, min: Option<f64>, max: Option<f64>, unit: &str) -> Option<String> {
    if let Some(min) = min {
        if value < min {
            return Some(format!("{metric} {value:.1} {unit} below minimum {min:.1}"));
        }
    }
    if let Some(max) = max {
        if value > max {
            return Some(format!("{metric} {value:.1} {unit} above maximum {max:.1}"));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hydrated(vamb: f64, rho: f64, ta: f64, tt: Option<f64>) -> CorrectionInput {
        CorrectionInput {
            product: ProductKind::HydratedEthanol,
            vamb,
            rho,
            ta,
            tt,
            empty: false,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn within_tolerance_is_ok() {
        let config = CorrectionConfig::default();
        let result = correct(&hydrated(1000.0, 809.0, 20.0, None), &config).unwrap();
        assert_eq!(result.status, ComplianceStatus::Ok);
        assert!(result.messages.is_empty());
        assert!(approx(result.r20, 809.0));
        assert!(approx(result.fcv, 1.0));
        assert!(approx(result.v20, 1000.0));
        // between (807.6, 93.8) and (811.0, 92.5)
        assert!(approx(result.inpm, 93.8 - 1.4 * 1.3 / 3.4));
    }

    #[test]
    fn density_out_of_band_is_fora() {
        let config = CorrectionConfig::default();
        let result = correct(&hydrated(1000.0, 815.0, 20.0, None), &config).unwrap();
        assert_eq!(result.status, ComplianceStatus::Fora);
        assert!(result.messages.iter().any(|m| m.starts_with(METRIC_DENSITY)));
    }

    #[test]
    fn only_failing_metric_is_named() {
        let mut config = CorrectionConfig::default();
        config.products.hydrated.inpm_min = None;
        config.products.hydrated.inpm_max = None;
        let result = correct(&hydrated(1000.0, 815.0, 20.0, None), &config).unwrap();
        assert_eq!(result.messages.len(), 1);
        assert!(result.messages[0].starts_with("ρ@20 815.0"));
    }

    #[test]
    fn temperature_correction() {
        let config = CorrectionConfig::default();
        // k = 0.83: r20 = 801 + 0.83 * 10 = 809.3; tank at 25 °C → 809.3 - 4.15
        let result = correct(&hydrated(2000.0, 801.0, 30.0, Some(25.0)), &config).unwrap();
        assert!(approx(result.r20, 809.3));
        let expected_fcv = (809.3 - 4.15) / 809.3;
        assert!(approx(result.fcv, expected_fcv));
        assert!(approx(result.v20, 2000.0 * expected_fcv));
        assert!(result.fcv < 1.0);
        assert_eq!(result.status, ComplianceStatus::Ok);
    }

    #[test]
    fn empty_tank_is_zeroed_and_pending() {
        let config = CorrectionConfig::default();
        let mut input = hydrated(1000.0, 900.0, 20.0, None);
        input.empty = true;
        let result = correct(&input, &config).unwrap();
        assert_eq!(result, CorrectionResult::default());
        assert_eq!(result.status, ComplianceStatus::Pending);
    }

    #[test]
    fn bulk_bypasses_correction() {
        let config = CorrectionConfig::default();
        let input = CorrectionInput {
            product: ProductKind::Bulk,
            vamb: 350.0,
            rho: 0.0,
            ta: f64::NAN,
            tt: None,
            empty: false,
        };
        let result = correct(&input, &config).unwrap();
        assert_eq!(result.v20, 350.0);
        assert_eq!(result.fcv, 1.0);
        assert_eq!(result.status, ComplianceStatus::Ok);
    }

    #[test]
    fn invalid_density_fails() {
        let config = CorrectionConfig::default();
        let err = correct(&hydrated(1000.0, 0.0, 20.0, None), &config).unwrap_err();
        assert!(matches!(err, GaugeError::InvalidReading { field: "rho", .. }));
    }

    #[test]
    fn inpm_clamps_outside_table() {
        let config = CorrectionConfig::default();
        assert_eq!(inpm_from_density(700.0, &config.alcoholometric), 100.0);
        assert_eq!(inpm_from_density(1100.0, &config.alcoholometric), 0.0);
    }

    #[test]
    fn product_labels() {
        assert_eq!(ProductKind::from_label("EHC"), ProductKind::HydratedEthanol);
        assert_eq!(ProductKind::from_label("Etanol Anidro"), ProductKind::AnhydrousEthanol);
        assert_eq!(ProductKind::from_label("AEHC - safra 25"), ProductKind::HydratedEthanol);
        assert_eq!(ProductKind::from_label("Soja"), ProductKind::Bulk);
        assert_eq!(ProductKind::from_label(""), ProductKind::Bulk);
    }

    #[test]
    fn rounding_for_presentation() {
        let result = CorrectionResult {
            r20: 809.2549,
            fcv: 0.994872,
            inpm: 93.2647,
            v20: 1989.74412,
            status: ComplianceStatus::Ok,
            messages: Vec::new(),
        };
        let r = result.rounded();
        assert_eq!(r.r20, 809.3);
        assert_eq!(r.fcv, 0.9949);
        assert_eq!(r.inpm, 93.3);
        assert_eq!(r.v20, 1989.744);
    }
}
