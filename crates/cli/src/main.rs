// tankgauge CLI - tank gauging, ethanol correction and cadastral import

mod exit_codes;
mod gauge;
mod import;
mod records;
mod workspace;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tankgauge_gauging::{GaugeError, Trim};

use exit_codes::{
    EXIT_ERROR, EXIT_GAUGE_INVALID, EXIT_GAUGE_NOT_FOUND, EXIT_GAUGE_RANGE, EXIT_IO,
    EXIT_STORE_CORRUPT, EXIT_SUCCESS, EXIT_TABLES_INVALID, EXIT_USAGE,
};
use records::TablesCommands;
use workspace::Workspace;

#[derive(Parser)]
#[command(name = "tankgauge")]
#[command(about = "Tank calibration, volume correction and cadastral import (headless)")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Settings file (default: platform config dir/tankgauge/settings.json)
    #[arg(long, global = true, env = "TANKGAUGE_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding calibration.json and history/ (overrides settings)
    #[arg(long, global = true, env = "TANKGAUGE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Correction tables TOML (overrides settings)
    #[arg(long, global = true)]
    tables: Option<PathBuf>,

    /// Log progress to stderr (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Import BALSA/TANQUE/CALIBRACAO/MEDICAO records into the calibration store
    #[command(after_help = "\
Examples:
  tankgauge import cadastro.txt
  tankgauge import cadastro.txt --json
  tankgauge import medicoes.txt --output report.json --fail-on-error
  tankgauge import cadastro.txt --dry-run")]
    Import {
        /// Text file with one or more tagged records
        file: PathBuf,

        /// Output JSON report to stdout instead of human summary
        #[arg(long)]
        json: bool,

        /// Write JSON report to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Exit non-zero when any record failed (changes are still saved)
        #[arg(long)]
        fail_on_error: bool,

        /// Report what would change without saving the snapshot or history
        #[arg(long)]
        dry_run: bool,
    },

    /// Ambient volume for a tank reading, from its calibration curve
    #[command(after_help = "\
Examples:
  tankgauge volume --tank T1 --trim 0 --height 152.5
  tankgauge volume --tank T1 --trim -25 --height 80")]
    Volume {
        /// Tank external id
        #[arg(long)]
        tank: String,

        /// Trim condition (+50, +25, 0, -25, ...)
        #[arg(long, allow_hyphen_values = true)]
        trim: Trim,

        /// Sounding height
        #[arg(long)]
        height: f64,
    },

    /// Correct an ambient volume to the reference temperature and check compliance
    #[command(after_help = "\
Examples:
  tankgauge correct --product EHC --vamb 5000 --density 805.2 --sample-temp 28.5
  tankgauge correct --product EAC --vamb 5000 --density 785.0 --sample-temp 25 --tank-temp 27
  tankgauge correct --product soja --vamb 1200")]
    Correct {
        #[command(flatten)]
        sample: gauge::SampleArgs,

        /// Ambient volume
        #[arg(long)]
        vamb: f64,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Volume lookup followed by correction, in one step
    #[command(after_help = "\
Examples:
  tankgauge gauge --tank T1 --trim 0 --height 152.5 --product EHC --density 805.2 --sample-temp 28.5")]
    Gauge {
        /// Tank external id
        #[arg(long)]
        tank: String,

        #[arg(long, allow_hyphen_values = true)]
        trim: Trim,

        #[arg(long)]
        height: f64,

        #[command(flatten)]
        sample: gauge::SampleArgs,

        #[arg(long)]
        json: bool,
    },

    /// Measurement history of a vessel, newest first
    #[command(after_help = "\
Examples:
  tankgauge history B1
  tankgauge history B1 --limit 5 --json")]
    History {
        /// Vessel external id
        vessel: String,

        /// Show at most N entries
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// List vessels and their tanks
    Vessels {
        #[arg(long)]
        json: bool,
    },

    /// Correction tables
    #[command(subcommand)]
    Tables(TablesCommands),
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let level = if verbose { tracing::Level::INFO } else { tracing::Level::WARN };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));
    // stdout carries command output
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let Some(command) = cli.command else {
        eprintln!("Usage: tankgauge <command> [options]");
        eprintln!("       tankgauge --help for more information");
        return ExitCode::from(EXIT_SUCCESS);
    };

    let ws = Workspace::open(cli.config, cli.data_dir, cli.tables);

    let result = match command {
        Commands::Import { file, json, output, fail_on_error, dry_run } => {
            import::cmd_import(&ws, file, json, output, fail_on_error, dry_run)
        }
        Commands::Volume { tank, trim, height } => gauge::cmd_volume(&ws, &tank, trim, height),
        Commands::Correct { sample, vamb, json } => gauge::cmd_correct(&ws, &sample, vamb, json),
        Commands::Gauge { tank, trim, height, sample, json } => {
            gauge::cmd_gauge(&ws, &tank, trim, height, &sample, json)
        }
        Commands::History { vessel, limit, json } => records::cmd_history(&ws, &vessel, limit, json),
        Commands::Vessels { json } => records::cmd_vessels(&ws, json),
        Commands::Tables(cmd) => records::cmd_tables(&ws, cmd),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {message}");
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {hint}");
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    /// Map an engine error to its exit code.
    pub fn gauge(err: &GaugeError) -> Self {
        let code = match err {
            GaugeError::VesselNotFound(_) | GaugeError::TankNotFound(_) => EXIT_GAUGE_NOT_FOUND,
            GaugeError::NoCalibrationForTrim { .. } | GaugeError::HeightOutOfRange { .. } => {
                EXIT_GAUGE_RANGE
            }
            GaugeError::InvalidReading { .. } | GaugeError::MissingField(_) => EXIT_GAUGE_INVALID,
            GaugeError::ConfigParse(_) | GaugeError::ConfigValidation(_) => EXIT_TABLES_INVALID,
            GaugeError::Snapshot(_) => EXIT_STORE_CORRUPT,
            GaugeError::TankOwnedByOtherVessel { .. } => EXIT_ERROR,
        };
        Self::new(code, err.to_string())
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn negative_trim_parses() {
        let cli = Cli::try_parse_from(["tankgauge", "volume", "--tank", "T1", "--trim", "-25", "--height", "10"]).unwrap();
        match cli.command {
            Some(Commands::Volume { trim, .. }) => assert_eq!(trim, Trim(-25)),
            _ => panic!("expected volume"),
        }
    }

    #[test]
    fn gauge_errors_map_to_codes() {
        let err = GaugeError::HeightOutOfRange { trim: Trim(0), height: 150.0, min: 0.0, max: 100.0 };
        assert_eq!(CliError::gauge(&err).code, EXIT_GAUGE_RANGE);
        assert_eq!(CliError::gauge(&GaugeError::TankNotFound("T9".into())).code, EXIT_GAUGE_NOT_FOUND);
    }
}
