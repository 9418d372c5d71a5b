//! In-progress gauging operations and their per-tank working records.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::CorrectionConfig;
use crate::correction::{correct, ComplianceStatus, CorrectionInput, CorrectionResult, ProductKind};
use crate::error::GaugeError;
use crate::interpolate::volume_at;
use crate::model::{MeasurementLog, OperationType, TankId, TankReading, Trim, Vessel, VesselId, VesselTank};

/// A tank's mutable state during one operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationTank {
    pub id: String,
    pub vessel_tank_id: Option<TankId>,
    pub tank_name: String,
    pub product: String,
    pub vamb: Option<f64>,
    pub rho: Option<f64>,
    pub ta: Option<f64>,
    pub tt: Option<f64>,
    pub trim: Option<Trim>,
    pub height: Option<f64>,
    pub ballast: Option<f64>,
    #[serde(default)]
    pub empty: bool,
    #[serde(default)]
    pub results: CorrectionResult,
    /// Tamper-seal (lacre) identifiers.
    #[serde(default)]
    pub seals: BTreeSet<String>,
}

impl OperationTank {
    pub fn new(tank_name: impl Into<String>, product: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            vessel_tank_id: None,
            tank_name: tank_name.into(),
            product: product.into(),
            vamb: None,
            rho: None,
            ta: None,
            tt: None,
            trim: None,
            height: None,
            ballast: None,
            empty: false,
            results: CorrectionResult::default(),
            seals: BTreeSet::new(),
        }
    }

    pub fn from_vessel_tank(tank: &VesselTank, product: impl Into<String>) -> Self {
        let mut op_tank = Self::new(tank.tank_name.clone(), product);
        op_tank.vessel_tank_id = Some(tank.id.clone());
        op_tank
    }

    /// Returns false when the seal was already attached.
    pub fn add_seal(&mut self, seal: &str) -> bool {
        let seal = seal.trim();
        if seal.is_empty() {
            return false;
        }
        self.seals.insert(seal.to_string())
    }

    pub fn remove_seal(&mut self, seal: &str) -> bool {
        self.seals.remove(seal.trim())
    }

    /// Re-derive `vamb` (from the calibration curve, when a reading and a
    /// calibrated tank are available) and the correction results.
    ///
    /// Incomplete inputs leave the results pending. On error the results are
    /// reset to pending, a curve-derived `vamb` is cleared and the error is
    /// returned.
    pub fn recalculate(
        &mut self,
        calibration: Option<&VesselTank>,
        config: &CorrectionConfig,
    ) -> Result<(), GaugeError> {
        match self.compute(calibration, config) {
            Ok(results) => {
                self.results = results;
                Ok(())
            }
            Err(e) => {
                self.results = CorrectionResult::default();
                Err(e)
            }
        }
    }

    fn compute(
        &mut self,
        calibration: Option<&VesselTank>,
        config: &CorrectionConfig,
    ) -> Result<CorrectionResult, GaugeError> {
        if self.empty {
            return Ok(CorrectionResult::default());
        }

        if let (Some(tank), Some(trim), Some(height)) = (calibration, self.trim, self.height) {
            // vamb always belongs to the current reading
            match volume_at(tank, trim, height) {
                Ok(volume) => self.vamb = Some(volume),
                Err(e) => {
                    self.vamb = None;
                    return Err(e);
                }
            }
        }

        let Some(vamb) = self.vamb else {
            return Ok(CorrectionResult::default());
        };

        let product = ProductKind::from_label(&self.product);
        let (rho, ta) = match (self.rho, self.ta) {
            (Some(rho), Some(ta)) => (rho, ta),
            _ if product.is_liquid() => return Ok(CorrectionResult::default()),
            _ => (0.0, config.reference_temperature),
        };

        correct(
            &CorrectionInput {
                product,
                vamb,
                rho,
                ta,
                tt: self.tt,
                empty: false,
            },
            config,
        )
    }

    /// Volume this tank contributes to an archived log.
    pub fn final_volume(&self) -> f64 {
        if self.empty {
            0.0
        } else if self.results.status == ComplianceStatus::Pending {
            self.vamb.unwrap_or(0.0)
        } else {
            self.results.v20
        }
    }
}

/// A gauging operation in progress on one vessel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub vessel_id: VesselId,
    pub operation: OperationType,
    pub product: String,
    pub operator: String,
    pub origin: String,
    pub destination: String,
    pub tanks: Vec<OperationTank>,
}

impl Operation {
    pub fn new(vessel_id: VesselId, operation: OperationType) -> Self {
        Self {
            vessel_id,
            operation,
            product: String::new(),
            operator: String::new(),
            origin: String::new(),
            destination: String::new(),
            tanks: Vec::new(),
        }
    }

    /// One working tank per registered vessel tank, in vessel order.
    pub fn seed_from_vessel(vessel: &Vessel, operation: OperationType, product: &str) -> Self {
        let mut op = Self::new(vessel.id.clone(), operation);
        op.product = product.to_string();
        op.tanks = vessel
            .tanks
            .iter()
            .map(|t| OperationTank::from_vessel_tank(t, product))
            .collect();
        op
    }

    pub fn add_tank(&mut self, tank: OperationTank) {
        self.tanks.push(tank);
    }

    pub fn remove_tank(&mut self, id: &str) -> Option<OperationTank> {
        let idx = self.tanks.iter().position(|t| t.id == id)?;
        Some(self.tanks.remove(idx))
    }

    pub fn tank_mut(&mut self, id: &str) -> Option<&mut OperationTank> {
        self.tanks.iter_mut().find(|t| t.id == id)
    }

    /// Recalculate every tank against the vessel's calibration. Errors are
    /// returned per tank name; the remaining tanks are still recalculated.
    pub fn recalculate_all(&mut self, vessel: &Vessel, config: &CorrectionConfig) -> Vec<(String, GaugeError)> {
        let mut failures = Vec::new();
        for tank in &mut self.tanks {
            let calibration = tank.vessel_tank_id.as_ref().and_then(|id| vessel.find_tank(id));
            if let Err(e) = tank.recalculate(calibration, config) {
                failures.push((tank.tank_name.clone(), e));
            }
        }
        failures
    }

    pub fn total_volume(&self) -> f64 {
        self.tanks.iter().map(OperationTank::final_volume).sum()
    }

    /// Close the operation into an immutable log entry.
    pub fn archive(self, timestamp: NaiveDateTime) -> MeasurementLog {
        let total_volume = self.total_volume();
        let measurements = self
            .tanks
            .iter()
            .map(|t| TankReading {
                tank_id: t.vessel_tank_id.clone(),
                tank_name: t.tank_name.clone(),
                trim: t.trim.unwrap_or(Trim(0)),
                height: t.height.unwrap_or(0.0),
                calculated_volume: t.final_volume(),
            })
            .collect();

        MeasurementLog {
            id: uuid::Uuid::new_v4().to_string(),
            vessel_id: self.vessel_id,
            timestamp,
            operation: self.operation,
            product: self.product,
            operator: self.operator,
            origin: self.origin,
            destination: self.destination,
            total_volume,
            measurements,
        }
    }
}
