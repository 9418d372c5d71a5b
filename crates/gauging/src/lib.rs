//! `tankgauge-gauging`: tank calibration, volume interpolation and
//! density/temperature correction.
//!
//! Pure crate: no IO. Callers hand in calibration snapshots and readings and
//! get back volumes, corrected results and new snapshots.

pub mod config;
pub mod correction;
pub mod error;
pub mod interpolate;
pub mod model;
pub mod operation;
pub mod store;

pub use config::CorrectionConfig;
pub use correction::{correct, ComplianceStatus, CorrectionInput, CorrectionResult, ProductKind};
pub use error::GaugeError;
pub use interpolate::volume_at;
pub use model::{
    CalibrationPoint, MeasurementLog, OperationType, TankId, TankReading, Trim, Vessel, VesselId,
    VesselTank, UNKNOWN_TANK,
};
pub use operation::{Operation, OperationTank};
pub use store::{Applied, CalibrationStore, CalibrationUpsert, TankUpsert, Upsert, UpsertOutcome, VesselUpsert};
