// End-to-end tests for the `tankgauge` binary.
// Run with: cargo test -p tankgauge-cli --test cli_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn fixture(name: &str) -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

/// Each test gets its own settings file and data directory.
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self { dir: tempfile::tempdir().unwrap() }
    }

    fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_tankgauge"))
            .arg("--config")
            .arg(self.dir.path().join("settings.json"))
            .arg("--data-dir")
            .arg(self.data_dir())
            .args(args)
            .env_remove("RUST_LOG")
            .env_remove("TANKGAUGE_CONFIG")
            .env_remove("TANKGAUGE_DATA_DIR")
            .output()
            .expect("spawn tankgauge")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn code(output: &Output) -> i32 {
    output.status.code().unwrap_or(-1)
}

// ---------------------------------------------------------------------------
// import
// ---------------------------------------------------------------------------

#[test]
fn import_then_volume() {
    let sb = Sandbox::new();

    let out = sb.run(&["import", &fixture("cadastre.txt")]);
    assert_eq!(code(&out), 0, "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("vessels 1 new"));
    assert!(sb.data_dir().join("calibration.json").exists());

    let out = sb.run(&["volume", "--tank", "T1", "--trim", "0", "--height", "50"]);
    assert_eq!(code(&out), 0, "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out).trim(), "250.000");

    let out = sb.run(&["volume", "--tank", "T1", "--trim", "+25", "--height", "100"]);
    assert_eq!(stdout(&out).trim(), "510.000");
}

#[test]
fn import_json_report() {
    let sb = Sandbox::new();
    let out = sb.run(&["import", &fixture("cadastre.txt"), "--json"]);
    assert_eq!(code(&out), 0);

    let report: serde_json::Value = serde_json::from_str(&stdout(&out)).expect("valid JSON");
    assert_eq!(report["dry_run"], false);
    assert_eq!(report["summary"]["vessels_created"], 1);
    assert_eq!(report["summary"]["tanks_created"], 2);
    assert_eq!(report["summary"]["points_added"], 6);
    assert!(report["summary"]["errors"].as_array().unwrap().is_empty());
}

#[test]
fn import_output_file() {
    let sb = Sandbox::new();
    let report = sb.dir.path().join("report.json");
    let out = sb.run(&["import", &fixture("cadastre.txt"), "--output", report.to_str().unwrap()]);
    assert_eq!(code(&out), 0);
    assert!(stdout(&out).is_empty());

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(written["summary"]["vessels_created"], 1);
}

#[test]
fn record_errors_only_fail_when_asked() {
    let sb = Sandbox::new();

    let out = sb.run(&["import", &fixture("broken_reference.txt")]);
    assert_eq!(code(&out), 0);
    assert!(stderr(&out).contains("failed:  line 2"));

    let out = sb.run(&["import", &fixture("broken_reference.txt"), "--fail-on-error"]);
    assert_eq!(code(&out), 11);

    // the good record was still saved
    let out = sb.run(&["vessels", "--json"]);
    let vessels: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(vessels.as_array().unwrap().len(), 1);
}

#[test]
fn blank_file_is_rejected() {
    let sb = Sandbox::new();
    let out = sb.run(&["import", &fixture("blank.txt")]);
    assert_eq!(code(&out), 10);
    assert!(stderr(&out).contains("empty"));
}

#[test]
fn missing_file_is_io_error() {
    let sb = Sandbox::new();
    let out = sb.run(&["import", &fixture("does_not_exist.txt")]);
    assert_eq!(code(&out), 3);
}

#[test]
fn dry_run_saves_nothing() {
    let sb = Sandbox::new();
    let out = sb.run(&["import", &fixture("cadastre.txt"), "--dry-run"]);
    assert_eq!(code(&out), 0);
    assert!(stderr(&out).starts_with("dry-run import"));
    assert!(!sb.data_dir().join("calibration.json").exists());

    let out = sb.run(&["vessels", "--json"]);
    assert_eq!(stdout(&out).trim(), "[]");
}

// ---------------------------------------------------------------------------
// history
// ---------------------------------------------------------------------------

#[test]
fn measurements_land_in_history() {
    let sb = Sandbox::new();
    assert_eq!(code(&sb.run(&["import", &fixture("cadastre.txt")])), 0);
    let out = sb.run(&["import", &fixture("measurements.txt")]);
    assert_eq!(code(&out), 0, "stderr: {}", stderr(&out));

    let out = sb.run(&["history", "B1", "--json"]);
    assert_eq!(code(&out), 0);
    let logs: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    let logs = logs.as_array().unwrap();
    assert_eq!(logs.len(), 2);

    // newest first
    assert_eq!(logs[0]["operation"], "unloading");
    assert_eq!(logs[0]["total_volume"], 50.0);
    assert_eq!(logs[1]["total_volume"], 950.0);
    assert_eq!(logs[1]["measurements"][0]["calculated_volume"], 250.0);

    let out = sb.run(&["history", "B1", "--limit", "1", "--json"]);
    let limited: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(limited.as_array().unwrap().len(), 1);
}

#[test]
fn failed_snapshot_save_writes_no_history() {
    let sb = Sandbox::new();
    let cadastre = std::fs::read_to_string(fixture("cadastre.txt")).unwrap();
    let measurements = std::fs::read_to_string(fixture("measurements.txt")).unwrap();
    let batch = sb.dir.path().join("batch.txt");
    std::fs::write(&batch, format!("{cadastre}\n{measurements}")).unwrap();

    // the snapshot's temp file cannot be created
    std::fs::create_dir_all(sb.data_dir().join("calibration.json.tmp")).unwrap();

    let out = sb.run(&["import", batch.to_str().unwrap()]);
    assert_eq!(code(&out), 3, "stderr: {}", stderr(&out));
    assert!(!sb.data_dir().join("calibration.json").exists());
    assert!(!sb.data_dir().join("history").exists());
}

#[test]
fn history_of_unknown_vessel() {
    let sb = Sandbox::new();
    let out = sb.run(&["history", "B42"]);
    assert_eq!(code(&out), 20);
    assert!(stderr(&out).contains("hint:"));
}

// ---------------------------------------------------------------------------
// volume / correct / gauge
// ---------------------------------------------------------------------------

#[test]
fn volume_errors_have_distinct_codes() {
    let sb = Sandbox::new();
    assert_eq!(code(&sb.run(&["import", &fixture("cadastre.txt")])), 0);

    let out = sb.run(&["volume", "--tank", "T9", "--trim", "0", "--height", "50"]);
    assert_eq!(code(&out), 20);

    let out = sb.run(&["volume", "--tank", "T1", "--trim", "0", "--height", "150"]);
    assert_eq!(code(&out), 21);

    let out = sb.run(&["volume", "--tank", "T1", "--trim", "-25", "--height", "50"]);
    assert_eq!(code(&out), 21);
}

#[test]
fn correct_in_band_with_tables() {
    let sb = Sandbox::new();
    let out = sb.run(&[
        "--tables", &fixture("tables.toml"),
        "correct", "--product", "EHC", "--vamb", "500",
        "--density", "801", "--sample-temp", "30", "--json",
    ]);
    assert_eq!(code(&out), 0, "stderr: {}", stderr(&out));

    let result: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(result["status"], "OK");
    assert_eq!(result["inpm"], 93.0);
}

#[test]
fn gauge_out_of_spec_exits_non_zero() {
    let sb = Sandbox::new();
    assert_eq!(code(&sb.run(&["import", &fixture("cadastre.txt")])), 0);

    let out = sb.run(&[
        "--tables", &fixture("tables.toml"),
        "gauge", "--tank", "T1", "--trim", "0", "--height", "50",
        "--product", "EHC", "--density", "805", "--sample-temp", "30",
    ]);
    assert_eq!(code(&out), 23);
    // numbers are still printed
    assert!(stdout(&out).contains("vamb    250.000"));
    assert!(stdout(&out).contains("FORA"));
}

#[test]
fn ethanol_without_density_is_usage_error() {
    let sb = Sandbox::new();
    let out = sb.run(&["correct", "--product", "EAC", "--vamb", "100"]);
    assert_eq!(code(&out), 2);
}

// ---------------------------------------------------------------------------
// tables
// ---------------------------------------------------------------------------

#[test]
fn tables_validate() {
    let sb = Sandbox::new();
    let out = sb.run(&["tables", "validate", &fixture("tables.toml")]);
    assert_eq!(code(&out), 0);
    assert!(stdout(&out).starts_with("ok: reference 20 °C, 3 alcoholometric point(s)"));

    let out = sb.run(&["tables", "validate", &fixture("tables_single_point.toml")]);
    assert_eq!(code(&out), 40);
}

#[test]
fn tables_show_round_trips() {
    let sb = Sandbox::new();
    let out = sb.run(&["tables", "show"]);
    assert_eq!(code(&out), 0);

    let dumped = sb.dir.path().join("dumped.toml");
    std::fs::write(&dumped, stdout(&out)).unwrap();
    let out = sb.run(&["tables", "validate", dumped.to_str().unwrap()]);
    assert_eq!(code(&out), 0, "stderr: {}", stderr(&out));
}

#[test]
fn corrupt_snapshot_is_reported() {
    let sb = Sandbox::new();
    std::fs::create_dir_all(sb.data_dir()).unwrap();
    std::fs::write(sb.data_dir().join("calibration.json"), "{ not json").unwrap();

    let out = sb.run(&["vessels"]);
    assert_eq!(code(&out), 30);
}
