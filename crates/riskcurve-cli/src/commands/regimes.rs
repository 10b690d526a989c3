use clap::Args;
use serde_json::{json, Value};

use riskcurve_core::volatility::{regime_table, MarketRegime};

/// Arguments for the regime table
#[derive(Args)]
pub struct RegimesArgs {
    /// Classify this base volatility (e.g. 0.18) into a regime
    #[arg(long)]
    pub vol: Option<f64>,
}

pub fn run_regimes(args: RegimesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(vol) = args.vol {
        if !vol.is_finite() || vol < 0.0 {
            return Err(format!("--vol must be a non-negative number, got {vol}").into());
        }
        let regime = MarketRegime::classify(vol);
        return Ok(json!({
            "base_volatility": vol,
            "regime": regime,
            "config": regime.config(),
        }));
    }
    Ok(serde_json::to_value(regime_table())?)
}
