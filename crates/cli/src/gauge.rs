//! `tankgauge volume`, `correct` and `gauge`.

use clap::Args;
use serde::Serialize;
use tankgauge_gauging::{
    correct, volume_at, ComplianceStatus, CorrectionConfig, CorrectionInput, CorrectionResult,
    ProductKind, Trim,
};

use crate::exit_codes::EXIT_GAUGE_OUT_OF_SPEC;
use crate::workspace::{find_tank, Workspace};
use crate::CliError;

#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Product label (EAC/AEAC anhydrous, EHC/AEHC hydrated, anything else is bulk)
    #[arg(long)]
    pub product: String,

    /// Observed density at the sample temperature, kg/m³ (ethanol only)
    #[arg(long)]
    pub density: Option<f64>,

    /// Sample temperature, °C (ethanol only)
    #[arg(long = "sample-temp", allow_hyphen_values = true)]
    pub sample_temp: Option<f64>,

    /// Tank temperature, °C (defaults to the sample temperature)
    #[arg(long = "tank-temp", allow_hyphen_values = true)]
    pub tank_temp: Option<f64>,

    /// Tank is empty: results are zero
    #[arg(long)]
    pub empty: bool,
}

impl SampleArgs {
    fn to_input(&self, config: &CorrectionConfig, vamb: f64) -> Result<CorrectionInput, CliError> {
        let product = ProductKind::from_label(&self.product);
        let (rho, ta) = match (self.density, self.sample_temp) {
            (Some(rho), Some(ta)) => (rho, ta),
            _ if !product.is_liquid() || self.empty => (0.0, config.reference_temperature),
            _ => {
                return Err(CliError::args(format!("{product} needs --density and --sample-temp"))
                    .with_hint("bulk cargo labels skip correction and need neither"));
            }
        };
        Ok(CorrectionInput { product, vamb, rho, ta, tt: self.tank_temp, empty: self.empty })
    }
}

#[derive(Serialize)]
struct GaugeReport<'a> {
    tank: &'a str,
    trim: Trim,
    height: f64,
    vamb: f64,
    #[serde(flatten)]
    result: CorrectionResult,
}

pub fn cmd_volume(ws: &Workspace, tank: &str, trim: Trim, height: f64) -> Result<(), CliError> {
    let store = ws.load_store()?;
    let (_, vessel_tank) = find_tank(&store, tank)?;
    let volume = volume_at(vessel_tank, trim, height).map_err(|e| CliError::gauge(&e))?;
    println!("{volume:.3}");
    Ok(())
}

pub fn cmd_correct(ws: &Workspace, sample: &SampleArgs, vamb: f64, json: bool) -> Result<(), CliError> {
    let config = ws.load_tables()?;
    let input = sample.to_input(&config, vamb)?;
    let result = correct(&input, &config).map_err(|e| CliError::gauge(&e))?.rounded();

    if json {
        println!("{}", to_json(&result)?);
    } else {
        print_result(&result);
    }
    verdict(&result)
}

pub fn cmd_gauge(
    ws: &Workspace,
    tank: &str,
    trim: Trim,
    height: f64,
    sample: &SampleArgs,
    json: bool,
) -> Result<(), CliError> {
    let store = ws.load_store()?;
    let config = ws.load_tables()?;
    let (vessel, vessel_tank) = find_tank(&store, tank)?;

    let vamb = if sample.empty {
        0.0
    } else {
        volume_at(vessel_tank, trim, height).map_err(|e| CliError::gauge(&e))?
    };
    let input = sample.to_input(&config, vamb)?;
    let result = correct(&input, &config).map_err(|e| CliError::gauge(&e))?.rounded();

    if json {
        let report = GaugeReport { tank, trim, height, vamb, result: result.clone() };
        println!("{}", to_json(&report)?);
    } else {
        println!("{} / {} (trim {trim}, height {height})", vessel.name, vessel_tank.tank_name);
        println!("vamb    {vamb:.3}");
        print_result(&result);
    }
    verdict(&result)
}

fn print_result(result: &CorrectionResult) {
    println!("ρ@20    {:.1}", result.r20);
    println!("INPM    {:.1}", result.inpm);
    println!("FCV     {:.4}", result.fcv);
    println!("V20     {:.3}", result.v20);
    println!("status  {}", result.status);
    for msg in &result.messages {
        println!("  {msg}");
    }
}

/// FORA still prints its numbers but exits non-zero.
fn verdict(result: &CorrectionResult) -> Result<(), CliError> {
    if result.status == ComplianceStatus::Fora {
        return Err(CliError::new(EXIT_GAUGE_OUT_OF_SPEC, result.messages.join("; ")));
    }
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(|e| CliError::io(format!("JSON serialization error: {e}")))
}
