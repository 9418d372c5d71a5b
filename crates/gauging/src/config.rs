use serde::{Deserialize, Serialize};

use crate::error::GaugeError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Density/temperature correction tables and compliance bands.
///
/// Loaded from a `tables.toml`; every section is optional and falls back to
/// the built-in defaults. The defaults carry only published reference points
/// (ethanol specification limits and the density of ethanol/water mixtures
/// at 20 °C); operators are expected to load the full alcoholometric table
/// they are certified against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionConfig {
    #[serde(default = "default_reference_temperature")]
    pub reference_temperature: f64,
    #[serde(default)]
    pub products: ProductTables,
    /// Density at the reference temperature (kg/m³) → alcohol content (% mass).
    #[serde(default = "default_alcoholometric")]
    pub alcoholometric: Vec<AlcoholometricPoint>,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            reference_temperature: default_reference_temperature(),
            products: ProductTables::default(),
            alcoholometric: default_alcoholometric(),
        }
    }
}

fn default_reference_temperature() -> f64 {
    20.0
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductTables {
    #[serde(default = "ProductSpec::anhydrous")]
    pub anhydrous: ProductSpec,
    #[serde(default = "ProductSpec::hydrated")]
    pub hydrated: ProductSpec,
}

impl Default for ProductTables {
    fn default() -> Self {
        Self {
            anhydrous: ProductSpec::anhydrous(),
            hydrated: ProductSpec::hydrated(),
        }
    }
}

/// Compliance bands and thermal behaviour for one liquid product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSpec {
    /// kg/m³ at the reference temperature
    #[serde(default)]
    pub density_min: Option<f64>,
    #[serde(default)]
    pub density_max: Option<f64>,
    /// % mass
    #[serde(default)]
    pub inpm_min: Option<f64>,
    #[serde(default)]
    pub inpm_max: Option<f64>,
    /// Density change per °C (kg/m³/°C), positive: density falls as temperature rises.
    pub thermal_coefficient: f64,
}

impl ProductSpec {
    pub fn anhydrous() -> Self {
        Self {
            density_min: None,
            density_max: Some(791.5),
            inpm_min: Some(99.3),
            inpm_max: None,
            thermal_coefficient: 0.85,
        }
    }

    pub fn hydrated() -> Self {
        Self {
            density_min: Some(807.6),
            density_max: Some(811.0),
            inpm_min: Some(92.5),
            inpm_max: Some(93.8),
            thermal_coefficient: 0.83,
        }
    }
}

// ---------------------------------------------------------------------------
// Alcoholometric table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlcoholometricPoint {
    pub density: f64,
    pub inpm: f64,
}

fn default_alcoholometric() -> Vec<AlcoholometricPoint> {
    [
        (789.34, 100.0),
        (791.5, 99.3),
        (807.6, 93.8),
        (811.0, 92.5),
        (817.97, 90.0),
        (843.44, 80.0),
        (867.66, 70.0),
        (891.13, 60.0),
        (913.84, 50.0),
        (935.18, 40.0),
        (953.82, 30.0),
        (968.64, 20.0),
        (981.87, 10.0),
        (998.20, 0.0),
    ]
    .into_iter()
    .map(|(density, inpm)| AlcoholometricPoint { density, inpm })
    .collect()
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl CorrectionConfig {
    pub fn from_toml(input: &str) -> Result<Self, GaugeError> {
        let mut config: CorrectionConfig =
            toml::from_str(input).map_err(|e| GaugeError::ConfigParse(e.to_string()))?;
        config
            .alcoholometric
            .sort_by(|a, b| a.density.total_cmp(&b.density));
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GaugeError> {
        if !self.reference_temperature.is_finite() {
            return Err(GaugeError::ConfigValidation(
                "reference_temperature must be a finite number".into(),
            ));
        }

        validate_product("anhydrous", &self.products.anhydrous)?;
        validate_product("hydrated", &self.products.hydrated)?;

        if self.alcoholometric.len() < 2 {
            return Err(GaugeError::ConfigValidation(
                "alcoholometric table needs at least 2 points".into(),
            ));
        }
        for pair in self.alcoholometric.windows(2) {
            if pair[1].density <= pair[0].density {
                return Err(GaugeError::ConfigValidation(format!(
                    "alcoholometric densities must be strictly increasing (found {} after {})",
                    pair[1].density, pair[0].density
                )));
            }
            if pair[1].inpm >= pair[0].inpm {
                return Err(GaugeError::ConfigValidation(format!(
                    "alcohol content must fall as density rises (density {} has {} after {})",
                    pair[1].density, pair[1].inpm, pair[0].inpm
                )));
            }
        }

        Ok(())
    }
}

fn validate_product(name: &str, spec: &ProductSpec) -> Result<(), GaugeError> {
    if !spec.thermal_coefficient.is_finite() || spec.thermal_coefficient < 0.0 {
        return Err(GaugeError::ConfigValidation(format!(
            "products.{name}: thermal_coefficient must be a non-negative number"
        )));
    }
    if let (Some(min), Some(max)) = (spec.density_min, spec.density_max) {
        if min > max {
            return Err(GaugeError::ConfigValidation(format!(
                "products.{name}: density_min {min} exceeds density_max {max}"
            )));
        }
    }
    if let (Some(min), Some(max)) = (spec.inpm_min, spec.inpm_max) {
        if min > max {
            return Err(GaugeError::ConfigValidation(format!(
                "products.{name}: inpm_min {min} exceeds inpm_max {max}"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        CorrectionConfig::default().validate().unwrap();
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = CorrectionConfig::from_toml("").unwrap();
        assert_eq!(config.reference_temperature, 20.0);
        assert_eq!(config.products.hydrated.density_max, Some(811.0));
        assert_eq!(config.alcoholometric.len(), 14);
    }

    #[test]
    fn parse_custom_tables() {
        let input = r#"
reference_temperature = 20.0

[products.anhydrous]
density_max = 791.5
inpm_min = 99.3
thermal_coefficient = 0.86

[products.hydrated]
density_min = 805.0
density_max = 812.0
inpm_min = 92.0
inpm_max = 94.0
thermal_coefficient = 0.8

[[alcoholometric]]
density = 811.0
inpm = 92.5

[[alcoholometric]]
density = 789.34
inpm = 100.0
"#;
        let config = CorrectionConfig::from_toml(input).unwrap();
        assert_eq!(config.products.anhydrous.thermal_coefficient, 0.86);
        assert_eq!(config.products.hydrated.density_min, Some(805.0));
        // sorted by density on load
        assert_eq!(config.alcoholometric[0].density, 789.34);
    }

    #[test]
    fn reject_inverted_band() {
        let input = r#"
[products.hydrated]
density_min = 812.0
density_max = 805.0
thermal_coefficient = 0.8
"#;
        let err = CorrectionConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("products.hydrated"));
    }

    #[test]
    fn reject_short_table() {
        let input = r#"
[[alcoholometric]]
density = 789.34
inpm = 100.0
"#;
        let err = CorrectionConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("at least 2 points"));
    }

    #[test]
    fn reject_non_monotonic_table() {
        let input = r#"
[[alcoholometric]]
density = 789.34
inpm = 90.0

[[alcoholometric]]
density = 811.0
inpm = 92.5
"#;
        let err = CorrectionConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("alcohol content must fall"));
    }

    #[test]
    fn reject_unknown_types() {
        let err = CorrectionConfig::from_toml("reference_temperature = \"warm\"").unwrap_err();
        assert!(matches!(err, GaugeError::ConfigParse(_)));
    }
}
