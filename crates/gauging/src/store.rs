//! Vessel → tank → calibration-point store.
//!
//! The store is a plain value. `apply` returns a new snapshot and leaves the
//! receiver untouched; `apply_mut` is the in-place form used on a
//! transaction-local copy. Every upsert validates before it writes, so a
//! failed upsert never leaves a partial change behind.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::GaugeError;
use crate::model::{CalibrationPoint, TankId, Vessel, VesselId, VesselTank, UNKNOWN_TANK};

// ---------------------------------------------------------------------------
// Upsert payloads
// ---------------------------------------------------------------------------

/// Vessel keyed by external id. `None` fields keep the stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct VesselUpsert {
    pub external_id: String,
    pub name: String,
    pub executor: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub certificate_number: Option<String>,
    pub notes: Option<String>,
}

/// Tank keyed by external id, scoped to its parent vessel's external id.
#[derive(Debug, Clone, PartialEq)]
pub struct TankUpsert {
    pub vessel_external_id: String,
    pub tank_external_id: String,
    pub tank_name: Option<String>,
    pub max_calibrated_height: Option<f64>,
    pub max_volume: Option<f64>,
}

/// Calibration point keyed by (trim, height) in the tank with this external id.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationUpsert {
    pub tank_external_id: String,
    pub point: CalibrationPoint,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Upsert {
    Vessel(VesselUpsert),
    Tank(TankUpsert),
    Calibration(CalibrationUpsert),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// What an upsert did and which vessel it touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub outcome: UpsertOutcome,
    pub vessel_id: VesselId,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationStore {
    #[serde(default)]
    pub vessels: Vec<Vessel>,
}

impl CalibrationStore {
    pub fn new(vessels: Vec<Vessel>) -> Self {
        Self { vessels }
    }

    pub fn to_json(&self) -> Result<String, GaugeError> {
        serde_json::to_string_pretty(self).map_err(|e| GaugeError::Snapshot(e.to_string()))
    }

    pub fn from_json(input: &str) -> Result<Self, GaugeError> {
        serde_json::from_str(input).map_err(|e| GaugeError::Snapshot(e.to_string()))
    }

    // -- lookups ------------------------------------------------------------

    pub fn find_vessel(&self, id: &VesselId) -> Option<&Vessel> {
        self.vessels.iter().find(|v| &v.id == id)
    }

    pub fn find_vessel_by_external_id(&self, external_id: &str) -> Option<&Vessel> {
        self.vessel_index(external_id).map(|i| &self.vessels[i])
    }

    /// Tank with this external id in any vessel, with its owner.
    pub fn find_tank_by_external_id(&self, external_id: &str) -> Option<(&Vessel, &VesselTank)> {
        self.tank_index(external_id)
            .map(|(vi, ti)| (&self.vessels[vi], &self.vessels[vi].tanks[ti]))
    }

    pub fn find_tank(&self, id: &TankId) -> Option<(&Vessel, &VesselTank)> {
        self.vessels
            .iter()
            .find_map(|v| v.find_tank(id).map(|t| (v, t)))
    }

    /// Display name for a tank reference, tolerating deleted tanks.
    pub fn tank_label(&self, id: Option<&TankId>) -> String {
        id.and_then(|id| self.find_tank(id))
            .map(|(_, t)| t.tank_name.clone())
            .unwrap_or_else(|| UNKNOWN_TANK.to_string())
    }

    fn vessel_index(&self, external_id: &str) -> Option<usize> {
        let key = external_id.trim();
        if key.is_empty() {
            return None;
        }
        self.vessels
            .iter()
            .position(|v| v.external_id.as_deref() == Some(key))
    }

    fn tank_index(&self, external_id: &str) -> Option<(usize, usize)> {
        let key = external_id.trim();
        if key.is_empty() {
            return None;
        }
        self.vessels.iter().enumerate().find_map(|(vi, v)| {
            v.tanks
                .iter()
                .position(|t| t.external_id.as_deref() == Some(key))
                .map(|ti| (vi, ti))
        })
    }

    // -- upserts ------------------------------------------------------------

    /// Apply an upsert to a copy of the store and return the new snapshot.
    pub fn apply(&self, upsert: &Upsert) -> Result<(Self, Applied), GaugeError> {
        let mut next = self.clone();
        let applied = next.apply_mut(upsert)?;
        Ok((next, applied))
    }

    pub fn apply_mut(&mut self, upsert: &Upsert) -> Result<Applied, GaugeError> {
        match upsert {
            Upsert::Vessel(u) => self.upsert_vessel(u),
            Upsert::Tank(u) => self.upsert_tank(u),
            Upsert::Calibration(u) => self.upsert_calibration_point(u),
        }
    }

    pub fn upsert_vessel(&mut self, u: &VesselUpsert) -> Result<Applied, GaugeError> {
        let external_id = u.external_id.trim();
        if external_id.is_empty() {
            return Err(GaugeError::MissingField("externalId"));
        }
        if u.name.trim().is_empty() {
            return Err(GaugeError::MissingField("name"));
        }

        let (idx, outcome) = match self.vessel_index(external_id) {
            Some(idx) => (idx, UpsertOutcome::Updated),
            None => {
                let mut vessel = Vessel::new(u.name.trim());
                vessel.external_id = Some(external_id.to_string());
                log::debug!("new vessel {external_id} ({})", vessel.id.0);
                self.vessels.push(vessel);
                (self.vessels.len() - 1, UpsertOutcome::Created)
            }
        };

        let vessel = &mut self.vessels[idx];
        vessel.name = u.name.trim().to_string();
        if let Some(ref executor) = u.executor {
            vessel.executor = executor.clone();
        }
        if let Some(ref cert) = u.certificate_number {
            vessel.certificate_number = cert.clone();
        }
        if u.issue_date.is_some() {
            vessel.issue_date = u.issue_date;
        }
        if u.expiry_date.is_some() {
            vessel.expiry_date = u.expiry_date;
        }
        if let Some(ref notes) = u.notes {
            vessel.notes = notes.clone();
        }

        Ok(Applied { outcome, vessel_id: vessel.id.clone() })
    }

    pub fn upsert_tank(&mut self, u: &TankUpsert) -> Result<Applied, GaugeError> {
        let tank_key = u.tank_external_id.trim();
        if tank_key.is_empty() {
            return Err(GaugeError::MissingField("tankExternalId"));
        }
        let vi = self
            .vessel_index(&u.vessel_external_id)
            .ok_or_else(|| GaugeError::VesselNotFound(u.vessel_external_id.trim().to_string()))?;

        let existing = match self.tank_index(tank_key) {
            Some((owner, _)) if owner != vi => {
                return Err(GaugeError::TankOwnedByOtherVessel {
                    tank: tank_key.to_string(),
                    vessel: self.vessels[owner].name.clone(),
                });
            }
            Some((_, ti)) => Some(ti),
            None => None,
        };

        let vessel = &mut self.vessels[vi];
        let (ti, outcome) = match existing {
            Some(ti) => (ti, UpsertOutcome::Updated),
            None => {
                let name = u.tank_name.as_deref().unwrap_or(tank_key);
                let mut tank = VesselTank::new(name);
                tank.external_id = Some(tank_key.to_string());
                log::debug!("new tank {tank_key} on vessel {}", vessel.name);
                vessel.tanks.push(tank);
                (vessel.tanks.len() - 1, UpsertOutcome::Created)
            }
        };

        let tank = &mut vessel.tanks[ti];
        if let Some(ref name) = u.tank_name {
            tank.tank_name = name.clone();
        }
        if let Some(height) = u.max_calibrated_height {
            tank.max_calibrated_height = height;
        }
        if let Some(volume) = u.max_volume {
            tank.max_volume = volume;
        }

        Ok(Applied { outcome, vessel_id: vessel.id.clone() })
    }

    pub fn upsert_calibration_point(&mut self, u: &CalibrationUpsert) -> Result<Applied, GaugeError> {
        let (vi, ti) = self
            .tank_index(&u.tank_external_id)
            .ok_or_else(|| GaugeError::TankNotFound(u.tank_external_id.trim().to_string()))?;

        let vessel = &mut self.vessels[vi];
        let tank = &mut vessel.tanks[ti];
        let point = u.point;

        let outcome = match tank
            .calibration
            .iter_mut()
            .find(|p| p.trim == point.trim && p.height == point.height)
        {
            Some(existing) => {
                existing.volume = point.volume;
                UpsertOutcome::Updated
            }
            None => {
                tank.calibration.push(point);
                UpsertOutcome::Created
            }
        };

        Ok(Applied { outcome, vessel_id: vessel.id.clone() })
    }

    /// Set the vessel's theoretical capacity to the sum of its tanks' volumes.
    pub fn recompute_capacity(&mut self, id: &VesselId) {
        if let Some(vessel) = self.vessels.iter_mut().find(|v| &v.id == id) {
            vessel.total_theoretical_capacity = vessel.theoretical_capacity();
        }
    }
}
