use clap::Args;
use serde_json::Value;

use riskcurve_core::pricing::valuation::{ImpliedVolInput, OptionValuationInput};
use riskcurve_core::{implied_volatility, value_option};

use crate::input;

/// Arguments for single-option pricing
#[derive(Args)]
pub struct PriceArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_price(args: PriceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let opt_input: OptionValuationInput = input::read_input(args.input.as_deref(), "price")?;
    let result = value_option(&opt_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for implied volatility
#[derive(Args)]
pub struct ImpliedVolArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_implied_vol(args: ImpliedVolArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let iv_input: ImpliedVolInput = input::read_input(args.input.as_deref(), "implied-vol")?;
    let result = implied_volatility(&iv_input)?;
    Ok(serde_json::to_value(result)?)
}
