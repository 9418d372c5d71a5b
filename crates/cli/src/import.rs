//! `tankgauge import`: bulk cadastral and measurement import.

use std::path::PathBuf;

use serde::Serialize;
use tankgauge_gauging::MeasurementLog;
use tankgauge_recon::{reconcile, ImportError, ImportOutcome, ImportSummary, Importer};

use crate::exit_codes::{EXIT_IMPORT_NO_RECORDS, EXIT_IMPORT_RECORD_ERRORS};
use crate::workspace::Workspace;
use crate::CliError;

#[derive(Serialize)]
struct ImportReport<'a> {
    file: String,
    dry_run: bool,
    summary: &'a ImportSummary,
    logs: Vec<&'a MeasurementLog>,
}

pub fn cmd_import(
    ws: &Workspace,
    file: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    fail_on_error: bool,
    dry_run: bool,
) -> Result<(), CliError> {
    let text = std::fs::read_to_string(&file)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", file.display())))?;
    let store = ws.load_store()?;

    let mut outcome = reconcile(&store, &text).map_err(import_err)?;
    if !dry_run {
        // snapshot first: history entries reference vessel ids it defines
        ws.save_store(&outcome.store)?;
        let mut history = ws.history();
        Importer::new(&mut history).append_history(&mut outcome);
    }

    let report = ImportReport {
        file: file.display().to_string(),
        dry_run,
        summary: &outcome.summary,
        logs: outcome.logs.values().flatten().collect(),
    };
    let json_str = serde_json::to_string_pretty(&report)
        .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::io(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    // Human summary to stderr
    for line in summary_lines(&outcome, dry_run) {
        eprintln!("{line}");
    }

    let s = &outcome.summary;
    if fail_on_error && !s.is_clean() {
        return Err(CliError::new(
            EXIT_IMPORT_RECORD_ERRORS,
            format!("{} record(s) failed", s.errors.len()),
        ));
    }
    Ok(())
}

fn import_err(e: ImportError) -> CliError {
    CliError::new(EXIT_IMPORT_NO_RECORDS, e.to_string())
}

fn summary_lines(outcome: &ImportOutcome, dry_run: bool) -> Vec<String> {
    let s = &outcome.summary;
    let mut lines = vec![format!(
        "{}import: vessels {} new / {} updated, tanks {} new / {} updated, points {} new / {} updated, {} measurement log(s)",
        if dry_run { "dry-run " } else { "" },
        s.vessels_created,
        s.vessels_updated,
        s.tanks_created,
        s.tanks_updated,
        s.points_added,
        s.points_updated,
        s.measurement_logs,
    )];
    lines.extend(s.warnings.iter().map(|w| format!("warning: {w}")));
    lines.extend(s.errors.iter().map(|e| format!("failed:  {e}")));
    lines
}
