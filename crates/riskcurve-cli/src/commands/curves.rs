use clap::Args;
use serde_json::Value;

use riskcurve_core::{try_generate_curves, CurveInput};

use crate::input;

/// Arguments for curve generation
#[derive(Args)]
pub struct CurvesArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Override the scenario time offset, in days
    #[arg(long, allow_hyphen_values = true)]
    pub days: Option<f64>,

    /// Override the scenario spot offset, in price points
    #[arg(long, allow_hyphen_values = true)]
    pub spot_offset: Option<f64>,

    /// Override the scenario volatility offset (0.05 = +5 vol points)
    #[arg(long, allow_hyphen_values = true)]
    pub vol_offset: Option<f64>,
}

pub fn run_curves(args: CurvesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut curve_input: CurveInput = input::read_input(args.input.as_deref(), "curves")?;
    if let Some(days) = args.days {
        curve_input.scenario.time_offset_days = days;
    }
    if let Some(offset) = args.spot_offset {
        curve_input.scenario.spot_offset = offset;
    }
    if let Some(offset) = args.vol_offset {
        curve_input.scenario.volatility_offset = offset;
    }

    tracing::debug!(
        strategies = curve_input.strategies.len(),
        scenario = ?curve_input.scenario,
        "generating curves"
    );

    // The library entry point swallows failures into an empty chart; the CLI
    // reports them instead.
    let result = try_generate_curves(&curve_input)?;
    Ok(serde_json::to_value(result)?)
}
