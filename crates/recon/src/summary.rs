use crate::model::{ImportSummary, RecordOutcome};

/// Tally per-record outcomes into the import summary.
pub fn compute_summary(outcomes: &[RecordOutcome], warnings: Vec<String>) -> ImportSummary {
    let mut summary = ImportSummary { warnings, ..ImportSummary::default() };

    for outcome in outcomes {
        match outcome {
            RecordOutcome::VesselCreated => summary.vessels_created += 1,
            RecordOutcome::VesselUpdated => summary.vessels_updated += 1,
            RecordOutcome::TankCreated => summary.tanks_created += 1,
            RecordOutcome::TankUpdated => summary.tanks_updated += 1,
            RecordOutcome::PointAdded => summary.points_added += 1,
            RecordOutcome::PointUpdated => summary.points_updated += 1,
            RecordOutcome::MeasurementLogged => summary.measurement_logs += 1,
            RecordOutcome::Failed(message) => summary.errors.push(message.clone()),
        }
    }

    summary
}
