pub mod black_scholes;
pub mod normal;
#[cfg(feature = "simulation")]
pub mod simulation;
pub mod stochastic_vol;
pub mod valuation;

use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

use crate::types::{Rate, Years};
use crate::RiskCurveResult;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionRight {
    Call,
    Put,
}

/// Delta, gamma and theta. Theta is always per calendar day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionGreeks {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
}

impl OptionGreeks {
    pub const fn zero() -> Self {
        Self {
            delta: 0.0,
            gamma: 0.0,
            theta: 0.0,
        }
    }

    pub fn scale(&self, factor: f64) -> Self {
        Self {
            delta: self.delta * factor,
            gamma: self.gamma * factor,
            theta: self.theta * factor,
        }
    }
}

impl AddAssign for OptionGreeks {
    fn add_assign(&mut self, rhs: Self) {
        self.delta += rhs.delta;
        self.gamma += rhs.gamma;
        self.theta += rhs.theta;
    }
}

/// Valuation strategy behind the single pricing interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingModel {
    /// Closed-form lognormal, constant volatility.
    #[default]
    BlackScholes,
    /// Smile/skew-adjusted vol fed into the closed form.
    StochasticVolAnalytic,
    /// Seeded lognormal path simulation.
    MonteCarloLognormal,
    /// Seeded coupled price/variance path simulation.
    MonteCarloStochasticVol,
}

impl PricingModel {
    pub fn name(self) -> &'static str {
        match self {
            PricingModel::BlackScholes => "Black-Scholes (closed-form)",
            PricingModel::StochasticVolAnalytic => "Stochastic-vol smile approximation",
            PricingModel::MonteCarloLognormal => "Monte Carlo lognormal paths",
            PricingModel::MonteCarloStochasticVol => "Monte Carlo stochastic-vol paths",
        }
    }

    pub fn is_simulated(self) -> bool {
        matches!(
            self,
            PricingModel::MonteCarloLognormal | PricingModel::MonteCarloStochasticVol
        )
    }
}

/// Vol-of-vol multiplier used when the stochastic-vol simulation is swapped
/// for its analytic approximation on the curve path.
pub const CURVE_VOL_OF_VOL_BOOST: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingParams {
    #[serde(default)]
    pub model: PricingModel,
    /// Variance mean-reversion speed (kappa).
    #[serde(default = "default_mean_reversion")]
    pub mean_reversion: f64,
    /// Volatility of variance (xi).
    #[serde(default = "default_vol_of_vol")]
    pub vol_of_vol: f64,
    /// Spot/variance shock correlation (rho).
    #[serde(default = "default_correlation")]
    pub correlation: f64,
    #[serde(default = "default_num_paths")]
    pub num_paths: u32,
    #[serde(default = "default_time_steps")]
    pub time_steps: u32,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_mean_reversion() -> f64 {
    2.0
}

fn default_vol_of_vol() -> f64 {
    0.5
}

fn default_correlation() -> f64 {
    -0.7
}

fn default_num_paths() -> u32 {
    20_000
}

fn default_time_steps() -> u32 {
    64
}

fn default_seed() -> u64 {
    42
}

impl Default for PricingParams {
    fn default() -> Self {
        Self {
            model: PricingModel::default(),
            mean_reversion: default_mean_reversion(),
            vol_of_vol: default_vol_of_vol(),
            correlation: default_correlation(),
            num_paths: default_num_paths(),
            time_steps: default_time_steps(),
            seed: default_seed(),
        }
    }
}

impl PricingParams {
    pub fn with_model(model: PricingModel) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }

    /// The analytic stand-in used wherever a whole curve is priced.
    ///
    /// Lognormal simulation maps to the closed form; stochastic-vol
    /// simulation maps to the smile approximation with vol-of-vol scaled by
    /// [`CURVE_VOL_OF_VOL_BOOST`] to mimic the wider dispersion of real paths.
    pub fn for_curve(&self) -> PricingParams {
        match self.model {
            PricingModel::BlackScholes | PricingModel::StochasticVolAnalytic => *self,
            PricingModel::MonteCarloLognormal => PricingParams {
                model: PricingModel::BlackScholes,
                ..*self
            },
            PricingModel::MonteCarloStochasticVol => PricingParams {
                model: PricingModel::StochasticVolAnalytic,
                vol_of_vol: self.vol_of_vol * CURVE_VOL_OF_VOL_BOOST,
                ..*self
            },
        }
    }
}

/// One option to value. `time_to_expiry` is the real (unclamped) year
/// fraction; non-positive means expired and prices at intrinsic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingRequest {
    pub spot: f64,
    pub strike: f64,
    pub time_to_expiry: Years,
    pub risk_free_rate: Rate,
    pub volatility: Rate,
    pub right: OptionRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionValuation {
    pub price: f64,
    /// Absent for simulated models.
    pub greeks: Option<OptionGreeks>,
    /// Monte Carlo standard error; absent for analytic models.
    pub std_error: Option<f64>,
}

// ---------------------------------------------------------------------------
// Pricing interface
// ---------------------------------------------------------------------------

/// Price only, analytic models only. Simulated variants are routed through
/// [`PricingParams::for_curve`]; this is the per-grid-point hot path.
pub fn model_price(params: &PricingParams, req: &PricingRequest) -> f64 {
    let curve = params.for_curve();
    match curve.model {
        PricingModel::StochasticVolAnalytic => stochastic_vol::price(req, &curve),
        _ => black_scholes::price(req),
    }
}

/// Per-contract Greeks from the analytic counterpart of `params`.
pub fn model_greeks(params: &PricingParams, req: &PricingRequest) -> OptionGreeks {
    let curve = params.for_curve();
    match curve.model {
        PricingModel::StochasticVolAnalytic => stochastic_vol::greeks(req, &curve),
        _ => black_scholes::greeks(req),
    }
}

/// Full valuation with the selected model, including the simulated ones.
pub fn price_with_model(
    params: &PricingParams,
    req: &PricingRequest,
) -> RiskCurveResult<OptionValuation> {
    match params.model {
        PricingModel::BlackScholes => Ok(OptionValuation {
            price: black_scholes::price(req),
            greeks: Some(black_scholes::greeks(req)),
            std_error: None,
        }),
        PricingModel::StochasticVolAnalytic => Ok(OptionValuation {
            price: stochastic_vol::price(req, params),
            greeks: Some(stochastic_vol::greeks(req, params)),
            std_error: None,
        }),
        PricingModel::MonteCarloLognormal | PricingModel::MonteCarloStochasticVol => {
            simulated(params, req)
        }
    }
}

#[cfg(feature = "simulation")]
fn simulated(params: &PricingParams, req: &PricingRequest) -> RiskCurveResult<OptionValuation> {
    let result = match params.model {
        PricingModel::MonteCarloStochasticVol => simulation::simulate_stochastic_vol(req, params)?,
        _ => simulation::simulate_lognormal(req, params)?,
    };
    Ok(OptionValuation {
        price: result.price,
        greeks: None,
        std_error: Some(result.std_error),
    })
}

#[cfg(not(feature = "simulation"))]
fn simulated(params: &PricingParams, req: &PricingRequest) -> RiskCurveResult<OptionValuation> {
    tracing::warn!(
        model = ?params.model,
        "built without the simulation feature; using the analytic counterpart"
    );
    price_with_model(&params.for_curve(), req)
}
