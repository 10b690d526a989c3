use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::RiskCurveError;
use crate::pricing::black_scholes::{self, intrinsic_value};
use crate::pricing::{price_with_model, OptionGreeks, OptionRight, PricingParams, PricingRequest};
use crate::types::*;
use crate::RiskCurveResult;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionValuationInput {
    pub spot_price: f64,
    pub strike_price: f64,
    pub time_to_expiry: Years,
    #[serde(default)]
    pub risk_free_rate: Rate,
    pub volatility: Rate,
    pub right: OptionRight,
    #[serde(default)]
    pub pricing: PricingParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionValuationOutput {
    pub price: f64,
    pub intrinsic_value: f64,
    pub time_value: f64,
    pub greeks: Option<OptionGreeks>,
    pub std_error: Option<f64>,
    /// (K - S) / S
    pub moneyness: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpliedVolInput {
    pub spot_price: f64,
    pub strike_price: f64,
    pub time_to_expiry: Years,
    #[serde(default)]
    pub risk_free_rate: Rate,
    pub right: OptionRight,
    pub market_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpliedVolOutput {
    pub implied_vol: Rate,
    pub iterations: u32,
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn positive(field: &str, value: f64) -> RiskCurveResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(RiskCurveError::InvalidInput {
            field: field.into(),
            reason: "must be positive".into(),
        })
    }
}

fn validate_valuation_input(input: &OptionValuationInput) -> RiskCurveResult<()> {
    positive("spot_price", input.spot_price)?;
    positive("strike_price", input.strike_price)?;
    positive("volatility", input.volatility)?;
    if !input.time_to_expiry.is_finite() {
        return Err(RiskCurveError::InvalidInput {
            field: "time_to_expiry".into(),
            reason: "must be finite".into(),
        });
    }
    if !input.risk_free_rate.is_finite() {
        return Err(RiskCurveError::InvalidInput {
            field: "risk_free_rate".into(),
            reason: "must be finite".into(),
        });
    }
    Ok(())
}

fn validate_iv_input(input: &ImpliedVolInput) -> RiskCurveResult<()> {
    positive("spot_price", input.spot_price)?;
    positive("strike_price", input.strike_price)?;
    positive("time_to_expiry", input.time_to_expiry)?;
    positive("market_price", input.market_price)?;

    let req = PricingRequest {
        spot: input.spot_price,
        strike: input.strike_price,
        time_to_expiry: input.time_to_expiry,
        risk_free_rate: input.risk_free_rate,
        volatility: 0.0,
        right: input.right,
    };
    // Zero-vol price is the no-arbitrage floor.
    let floor = black_scholes::price(&req);
    let cap = match input.right {
        OptionRight::Call => input.spot_price,
        OptionRight::Put => input.strike_price * (-input.risk_free_rate * input.time_to_expiry).exp(),
    };
    if input.market_price < floor || input.market_price >= cap {
        return Err(RiskCurveError::InvalidInput {
            field: "market_price".into(),
            reason: format!("must lie within the arbitrage bounds [{floor:.6}, {cap:.6})"),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Public API: value_option
// ---------------------------------------------------------------------------

/// Single-point valuation with any of the four models, simulated ones
/// included.
pub fn value_option(
    input: &OptionValuationInput,
) -> RiskCurveResult<ComputationOutput<OptionValuationOutput>> {
    let start = Instant::now();
    validate_valuation_input(input)?;

    let mut warnings = Vec::new();
    let req = PricingRequest {
        spot: input.spot_price,
        strike: input.strike_price,
        time_to_expiry: input.time_to_expiry,
        risk_free_rate: input.risk_free_rate,
        volatility: input.volatility,
        right: input.right,
    };

    if input.time_to_expiry <= 0.0 {
        warnings.push("Option has expired; valued at intrinsic".to_string());
    }

    let valuation = price_with_model(&input.pricing, &req)?;
    let intrinsic = intrinsic_value(input.spot_price, input.strike_price, input.right);

    let output = OptionValuationOutput {
        price: valuation.price,
        intrinsic_value: intrinsic,
        time_value: valuation.price - intrinsic,
        greeks: valuation.greeks,
        std_error: valuation.std_error,
        moneyness: (input.strike_price - input.spot_price) / input.spot_price,
    };

    let methodology = input.pricing.model.name();
    let assumptions = serde_json::json!({
        "model": methodology,
        "risk_free_rate": input.risk_free_rate,
        "volatility": input.volatility,
        "mean_reversion": input.pricing.mean_reversion,
        "vol_of_vol": input.pricing.vol_of_vol,
        "correlation": input.pricing.correlation,
        "num_paths": input.pricing.num_paths,
        "time_steps": input.pricing.time_steps,
        "seed": input.pricing.seed,
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        methodology,
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Public API: implied_volatility
// ---------------------------------------------------------------------------

pub fn implied_volatility(
    input: &ImpliedVolInput,
) -> RiskCurveResult<ComputationOutput<ImpliedVolOutput>> {
    let start = Instant::now();
    validate_iv_input(input)?;

    let max_iter: u32 = 100;
    let eps = 1e-8;
    let mut sigma: f64 = 0.20;

    let mut iterations: u32 = 0;
    let mut last_delta = f64::INFINITY;

    for i in 0..max_iter {
        iterations = i + 1;
        let req = PricingRequest {
            spot: input.spot_price,
            strike: input.strike_price,
            time_to_expiry: input.time_to_expiry,
            risk_free_rate: input.risk_free_rate,
            volatility: sigma,
            right: input.right,
        };
        let diff = black_scholes::price(&req) - input.market_price;
        last_delta = diff.abs();

        if last_delta < eps {
            break;
        }

        let vega_raw = black_scholes::vega(&req);
        if vega_raw <= 1e-10 {
            return Err(RiskCurveError::ConvergenceFailure {
                function: "implied_volatility".into(),
                iterations,
                last_delta,
            });
        }

        sigma = (sigma - diff / vega_raw).clamp(0.001, 5.0);
    }

    if last_delta >= eps {
        return Err(RiskCurveError::ConvergenceFailure {
            function: "implied_volatility".into(),
            iterations,
            last_delta,
        });
    }

    let output = ImpliedVolOutput {
        implied_vol: sigma,
        iterations,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "model": "Newton-Raphson on Black-Scholes",
        "initial_vol": 0.20,
        "max_iterations": max_iter,
        "tolerance": eps,
    });

    Ok(with_metadata(
        "Newton-Raphson implied volatility",
        &assumptions,
        vec![],
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
