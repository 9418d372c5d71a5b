//! `tankgauge history`, `vessels` and `tables`.

use std::path::PathBuf;

use clap::Subcommand;
use tankgauge_gauging::{CalibrationStore, MeasurementLog, TankReading};
use tankgauge_recon::HistoryRepository;

use crate::exit_codes::{EXIT_HISTORY, EXIT_TABLES_INVALID};
use crate::workspace::{find_vessel, load_tables_file, Workspace};
use crate::CliError;

#[derive(Subcommand)]
pub enum TablesCommands {
    /// Parse and validate a correction tables file
    #[command(after_help = "\
Examples:
  tankgauge tables validate tables.toml")]
    Validate {
        /// Path to the tables TOML file
        file: PathBuf,
    },

    /// Print the effective correction tables as TOML
    #[command(after_help = "\
Examples:
  tankgauge tables show > tables.toml
  tankgauge tables show --tables site.toml")]
    Show,
}

pub fn cmd_tables(ws: &Workspace, cmd: TablesCommands) -> Result<(), CliError> {
    match cmd {
        TablesCommands::Validate { file } => {
            let config = load_tables_file(&file)?;
            println!(
                "ok: reference {} °C, {} alcoholometric point(s)",
                config.reference_temperature,
                config.alcoholometric.len()
            );
            Ok(())
        }
        TablesCommands::Show => {
            let config = ws.load_tables()?;
            let text = toml::to_string_pretty(&config)
                .map_err(|e| CliError::new(EXIT_TABLES_INVALID, format!("cannot render tables: {e}")))?;
            print!("{text}");
            Ok(())
        }
    }
}

pub fn cmd_history(ws: &Workspace, vessel_ext: &str, limit: Option<usize>, json: bool) -> Result<(), CliError> {
    let store = ws.load_store()?;
    let vessel = find_vessel(&store, vessel_ext)?;
    let mut logs = ws
        .history()
        .get(&vessel.id)
        .map_err(|e| CliError::new(EXIT_HISTORY, e.to_string()))?;
    if let Some(limit) = limit {
        logs.truncate(limit);
    }

    if json {
        let out = serde_json::to_string_pretty(&logs)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    if logs.is_empty() {
        eprintln!("no measurements recorded for {}", vessel.name);
        return Ok(());
    }
    for entry in &logs {
        for line in history_lines(&store, entry) {
            println!("{line}");
        }
    }
    Ok(())
}

/// Tank labels come from the current store so renamed tanks show their new
/// name and deleted ones show as unknown.
fn history_lines(store: &CalibrationStore, entry: &MeasurementLog) -> Vec<String> {
    let mut lines = vec![format!(
        "{}  {:<10} {:<12} {:>12.3}  {}",
        entry.timestamp.format("%Y-%m-%d %H:%M"),
        entry.operation.to_string(),
        entry.product,
        entry.total_volume,
        entry.operator,
    )];
    lines.extend(entry.measurements.iter().map(|r| {
        format!(
            "    {:<16} trim {:>4}  height {:>8.2}  volume {:>12.3}",
            reading_label(store, r),
            r.trim.to_string(),
            r.height,
            r.calculated_volume
        )
    }));
    lines
}

fn reading_label(store: &CalibrationStore, reading: &TankReading) -> String {
    match reading.tank_id {
        Some(ref id) => store.tank_label(Some(id)),
        None => reading.tank_name.clone(),
    }
}

pub fn cmd_vessels(ws: &Workspace, json: bool) -> Result<(), CliError> {
    let store = ws.load_store()?;

    if json {
        let out = serde_json::to_string_pretty(&store.vessels)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    if store.vessels.is_empty() {
        eprintln!("no vessels; import BALSA records first");
        return Ok(());
    }
    let today = chrono::Local::now().date_naive();
    for vessel in &store.vessels {
        let expiry = match vessel.expiry_date {
            Some(date) if date < today => format!("certificate expired {date}"),
            Some(date) => format!("certificate valid until {date}"),
            None => "no certificate expiry".to_string(),
        };
        println!(
            "{:<8} {:<24} {:>2} tank(s)  capacity {:>12.3}  {expiry}",
            vessel.external_id.as_deref().unwrap_or("-"),
            vessel.name,
            vessel.tanks.len(),
            vessel.total_theoretical_capacity,
        );
        for tank in &vessel.tanks {
            println!(
                "    {:<8} {:<16} max height {:>8.2}  max volume {:>12.3}  {} point(s)",
                tank.external_id.as_deref().unwrap_or("-"),
                tank.tank_name,
                tank.max_calibrated_height,
                tank.max_volume,
                tank.calibration.len(),
            );
        }
    }
    Ok(())
}
