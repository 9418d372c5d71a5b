use std::collections::{BTreeMap, BTreeSet};

use tankgauge_gauging::{
    volume_at, CalibrationStore, MeasurementLog, TankReading, Upsert, UpsertOutcome, VesselId,
    UNKNOWN_TANK,
};

use crate::aggregate::group_measurements;
use crate::error::{ImportError, RecordError};
use crate::history::{append_logs, HistoryRepository};
use crate::model::{
    ImportOutcome, ImportRecord, MeasurementGroup, MeasurementLine, RecordOutcome, RecordTag,
};
use crate::record::parse_record;
use crate::split::split_records;
use crate::summary::compute_summary;

/// Runs a batch against a calibration snapshot and appends the resulting
/// logs to the injected history repository.
pub struct Importer<'a, R: HistoryRepository + ?Sized> {
    history: &'a mut R,
}

impl<'a, R: HistoryRepository + ?Sized> Importer<'a, R> {
    pub fn new(history: &'a mut R) -> Self {
        Self { history }
    }

    /// Import `text` against `store`. Per-record failures land in
    /// `summary.errors`; only an empty or tagless input is an `Err`.
    pub fn import(&mut self, store: &CalibrationStore, text: &str) -> Result<ImportOutcome, ImportError> {
        let mut outcome = reconcile(store, text)?;
        self.append_history(&mut outcome);
        Ok(outcome)
    }

    /// Merge an outcome's logs into the repository. Callers that persist the
    /// snapshot themselves run this once it is saved. Failures are added to
    /// `summary.errors`.
    pub fn append_history(&mut self, outcome: &mut ImportOutcome) {
        for (vessel_id, logs) in &outcome.logs {
            match append_logs(&mut *self.history, vessel_id, logs.clone()) {
                Ok(merged) => log::debug!("vessel {vessel_id}: history now {} entries", merged.len()),
                Err(e) => outcome
                    .summary
                    .errors
                    .push(format!("history for vessel {vessel_id}: {e}")),
            }
        }
    }
}

/// Apply a batch to a copy of `store`. Cadastral records are applied in file
/// order; `MEDICAO` lines are grouped and resolved once every cadastral
/// record has been seen.
pub fn reconcile(store: &CalibrationStore, text: &str) -> Result<ImportOutcome, ImportError> {
    let split = split_records(text)?;

    let mut working = store.clone();
    let mut outcomes: Vec<RecordOutcome> = split
        .errors
        .iter()
        .map(|e| RecordOutcome::Failed(e.to_string()))
        .collect();
    let mut touched: BTreeSet<VesselId> = BTreeSet::new();
    let mut calibrated: BTreeSet<String> = BTreeSet::new();
    let mut measurements: Vec<(usize, MeasurementLine)> = Vec::new();

    // Pass 1: cadastral records, measurements collected
    for raw in &split.records {
        let parsed = match parse_record(raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                outcomes.push(RecordOutcome::Failed(e.to_string()));
                continue;
            }
        };
        let line = parsed.line;

        let (tag, upsert, created, updated) = match parsed.record {
            ImportRecord::Vessel(u) => (
                RecordTag::Balsa,
                Upsert::Vessel(u),
                RecordOutcome::VesselCreated,
                RecordOutcome::VesselUpdated,
            ),
            ImportRecord::Tank(u) => (
                RecordTag::Tanque,
                Upsert::Tank(u),
                RecordOutcome::TankCreated,
                RecordOutcome::TankUpdated,
            ),
            ImportRecord::Calibration(u) => {
                calibrated.insert(u.tank_external_id.trim().to_string());
                (
                    RecordTag::Calibracao,
                    Upsert::Calibration(u),
                    RecordOutcome::PointAdded,
                    RecordOutcome::PointUpdated,
                )
            }
            ImportRecord::Measurement(m) => {
                measurements.push((line, m));
                continue;
            }
        };

        match working.apply_mut(&upsert) {
            Ok(applied) => {
                touched.insert(applied.vessel_id);
                outcomes.push(match applied.outcome {
                    UpsertOutcome::Created => created,
                    UpsertOutcome::Updated => updated,
                });
            }
            Err(e) => {
                let err = RecordError::from_gauge(line, tag, &e);
                log::warn!("{err}");
                outcomes.push(RecordOutcome::Failed(err.to_string()));
            }
        }
    }

    for vessel_id in &touched {
        working.recompute_capacity(vessel_id);
    }

    // Pass 2: resolve grouped measurements against the updated snapshot
    let mut warnings: Vec<String> = Vec::new();
    let mut logs: BTreeMap<VesselId, Vec<MeasurementLog>> = BTreeMap::new();
    for group in group_measurements(&measurements) {
        match resolve_group(&working, &group) {
            Ok(resolved) => {
                outcomes.extend(resolved.errors.into_iter().map(|e| RecordOutcome::Failed(e.to_string())));
                warnings.extend(resolved.warnings);
                match resolved.log {
                    Some(entry) => {
                        outcomes.push(RecordOutcome::MeasurementLogged);
                        logs.entry(entry.vessel_id.clone()).or_default().push(entry);
                    }
                    None => outcomes.push(RecordOutcome::Failed(
                        RecordError::validation(group.first_line, RecordTag::Medicao, "no usable readings in measurement group")
                            .to_string(),
                    )),
                }
            }
            Err(e) => {
                log::warn!("{e}");
                outcomes.push(RecordOutcome::Failed(e.to_string()));
            }
        }
    }

    for tank_key in &calibrated {
        if let Some((_, tank)) = working.find_tank_by_external_id(tank_key) {
            warnings.extend(tank.curve_warnings());
        }
    }

    let summary = compute_summary(&outcomes, warnings);
    log::info!(
        "import: {} vessel(s) +{}/~{}, {} tank(s) +{}/~{}, {} point(s) +{}/~{}, {} log(s), {} error(s)",
        summary.vessels_created + summary.vessels_updated,
        summary.vessels_created,
        summary.vessels_updated,
        summary.tanks_created + summary.tanks_updated,
        summary.tanks_created,
        summary.tanks_updated,
        summary.points_added + summary.points_updated,
        summary.points_added,
        summary.points_updated,
        summary.measurement_logs,
        summary.errors.len(),
    );

    Ok(ImportOutcome { store: working, logs, summary })
}

struct ResolvedGroup {
    log: Option<MeasurementLog>,
    errors: Vec<RecordError>,
    warnings: Vec<String>,
}

/// Resolve a group's vessel and tanks. A missing vessel fails the whole
/// group; a missing tank keeps its reading under [`UNKNOWN_TANK`].
fn resolve_group(store: &CalibrationStore, group: &MeasurementGroup) -> Result<ResolvedGroup, RecordError> {
    let vessel_key = group.key.vessel_external_id.trim();
    let vessel = store.find_vessel_by_external_id(vessel_key).ok_or_else(|| {
        RecordError::reference(group.first_line, RecordTag::Medicao, format!("vessel '{vessel_key}' not found"))
    })?;

    let mut resolved = ResolvedGroup { log: None, errors: Vec::new(), warnings: Vec::new() };
    let mut readings = Vec::with_capacity(group.readings.len());
    let mut total_volume = group.total_volume;

    for reading in &group.readings {
        let tank_key = reading.tank_external_id.trim();
        let tank = vessel
            .tanks
            .iter()
            .find(|t| t.external_id.as_deref() == Some(tank_key));

        if tank.is_none() {
            resolved.warnings.push(format!(
                "line {} (MEDICAO): tank '{tank_key}' not found in vessel '{}', kept as '{UNKNOWN_TANK}'",
                reading.line, vessel.name
            ));
        }

        let volume = match (reading.volume, tank) {
            (Some(volume), _) => volume,
            (None, Some(tank)) => match volume_at(tank, reading.trim, reading.height) {
                Ok(volume) => {
                    total_volume += volume;
                    volume
                }
                Err(e) => {
                    resolved.errors.push(RecordError::from_gauge(reading.line, RecordTag::Medicao, &e));
                    continue;
                }
            },
            (None, None) => {
                resolved.errors.push(RecordError::reference(
                    reading.line,
                    RecordTag::Medicao,
                    format!("volume is blank and tank '{tank_key}' has no calibration to compute it"),
                ));
                continue;
            }
        };

        readings.push(TankReading {
            tank_id: tank.map(|t| t.id.clone()),
            tank_name: tank.map(|t| t.tank_name.clone()).unwrap_or_else(|| UNKNOWN_TANK.to_string()),
            trim: reading.trim,
            height: reading.height,
            calculated_volume: volume,
        });
    }

    if !readings.is_empty() {
        resolved.log = Some(MeasurementLog {
            id: uuid::Uuid::new_v4().to_string(),
            vessel_id: vessel.id.clone(),
            timestamp: group.key.timestamp,
            operation: group.operation.clone(),
            product: group.product.clone(),
            operator: group.key.operator.clone(),
            origin: group.origin.clone(),
            destination: group.destination.clone(),
            total_volume,
            measurements: readings,
        });
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::InMemoryHistory;

    const CADASTRE: &str = "\
BALSA;B1;Balsa 1;Hidrovias;2024-01-10;2026-01-10;CERT-1
TANQUE;B1;T1;Tanque 1;100;1000
CALIBRACAO;T1;0;0;0
CALIBRACAO;T1;0;100;1000
";

    #[test]
    fn cadastre_applies_in_order() {
        let outcome = reconcile(&CalibrationStore::default(), CADASTRE).unwrap();
        let s = &outcome.summary;
        assert!(s.is_clean(), "{:?}", s.errors);
        assert_eq!((s.vessels_created, s.tanks_created, s.points_added), (1, 1, 2));
        let vessel = outcome.store.find_vessel_by_external_id("B1").unwrap();
        assert_eq!(vessel.total_theoretical_capacity, 1000.0);
    }

    #[test]
    fn padded_fields_with_tag_word_names() {
        let text = "BALSA; B1; Balsa; Hidrovias\nTANQUE; B1; T1; Tanque; 100; 500\n";
        let outcome = reconcile(&CalibrationStore::default(), text).unwrap();
        let s = &outcome.summary;
        assert!(s.is_clean(), "{:?}", s.errors);
        assert_eq!((s.vessels_created, s.tanks_created), (1, 1));

        let (vessel, tank) = outcome.store.find_tank_by_external_id("T1").unwrap();
        assert_eq!(vessel.name, "Balsa");
        assert_eq!(vessel.executor, "Hidrovias");
        assert_eq!(tank.tank_name, "Tanque");
        assert_eq!(tank.max_volume, 500.0);
    }

    #[test]
    fn input_snapshot_is_not_modified() {
        let store = CalibrationStore::default();
        let outcome = reconcile(&store, CADASTRE).unwrap();
        assert!(store.vessels.is_empty());
        assert_eq!(outcome.store.vessels.len(), 1);
    }

    #[test]
    fn blank_volume_is_interpolated() {
        let text = format!("{CADASTRE}MEDICAO;B1;T1;2025-01-03 08:00;carga;0;50;;EHC;A;B;Ana\n");
        let outcome = reconcile(&CalibrationStore::default(), &text).unwrap();
        assert!(outcome.summary.is_clean(), "{:?}", outcome.summary.errors);
        let logs: Vec<&MeasurementLog> = outcome.logs.values().flatten().collect();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].measurements[0].calculated_volume, 500.0);
        assert_eq!(logs[0].total_volume, 500.0);
    }

    #[test]
    fn interpolation_failure_skips_reading() {
        let text = format!(
            "{CADASTRE}MEDICAO;B1;T1;2025-01-03 08:00;carga;0;150;;EHC;A;B;Ana\n\
             MEDICAO;B1;T1;2025-01-03 08:00;carga;25;10;;EHC;A;B;Ana\n"
        );
        let outcome = reconcile(&CalibrationStore::default(), &text).unwrap();
        // two range errors plus the empty group
        assert_eq!(outcome.summary.errors.len(), 3);
        assert_eq!(outcome.summary.measurement_logs, 0);
    }

    #[test]
    fn unknown_tank_keeps_reading() {
        let text = format!("{CADASTRE}MEDICAO;B1;T9;2025-01-03 08:00;carga;0;50;480;EHC;A;B;Ana\n");
        let outcome = reconcile(&CalibrationStore::default(), &text).unwrap();
        assert!(outcome.summary.is_clean());
        assert_eq!(outcome.summary.warnings.len(), 1);
        let reading = &outcome.logs.values().flatten().next().unwrap().measurements[0];
        assert_eq!(reading.tank_name, UNKNOWN_TANK);
        assert_eq!(reading.tank_id, None);
        assert_eq!(reading.calculated_volume, 480.0);
    }

    #[test]
    fn unknown_vessel_fails_group() {
        let text = format!("{CADASTRE}MEDICAO;B9;T1;2025-01-03 08:00;carga;0;50;480;EHC;A;B;Ana\n");
        let outcome = reconcile(&CalibrationStore::default(), &text).unwrap();
        assert_eq!(outcome.summary.errors.len(), 1);
        assert!(outcome.summary.errors[0].contains("vessel 'B9' not found"));
        assert!(outcome.logs.is_empty());
    }

    #[test]
    fn decreasing_curve_is_warned() {
        let text = format!("{CADASTRE}CALIBRACAO;T1;0;50;1200\n");
        let outcome = reconcile(&CalibrationStore::default(), &text).unwrap();
        assert!(outcome.summary.is_clean());
        assert_eq!(outcome.summary.warnings.len(), 1);
        assert!(outcome.summary.warnings[0].contains("volume decreases"));
    }

    #[test]
    fn importer_appends_history() {
        let mut history = InMemoryHistory::default();
        let text = format!("{CADASTRE}MEDICAO;B1;T1;2025-01-03 08:00;carga;0;50;500;EHC;A;B;Ana\n");
        let outcome = Importer::new(&mut history).import(&CalibrationStore::default(), &text).unwrap();
        let vessel_id = outcome.store.find_vessel_by_external_id("B1").unwrap().id.clone();
        assert_eq!(history.get(&vessel_id).unwrap().len(), 1);
    }

    #[test]
    fn empty_input_is_batch_error() {
        let mut history = InMemoryHistory::default();
        let err = Importer::new(&mut history).import(&CalibrationStore::default(), "").unwrap_err();
        assert_eq!(err, ImportError::EmptyInput);
    }
}
