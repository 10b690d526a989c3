use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;

use crate::error::RiskCurveError;
use crate::pricing::black_scholes::intrinsic_value;
use crate::pricing::{PricingParams, PricingRequest};
use crate::RiskCurveResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Discounted mean payoff over the simulated paths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub price: f64,
    pub std_error: f64,
    pub num_paths: u32,
}

/// Running mean/variance of discounted payoffs (Welford).
#[derive(Default)]
struct PayoffStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl PayoffStats {
    fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    fn finish(self, discount: f64) -> SimulationResult {
        let n = self.count.max(1) as f64;
        let variance = if self.count > 1 {
            self.m2 / (n - 1.0)
        } else {
            0.0
        };
        SimulationResult {
            price: discount * self.mean,
            std_error: discount * (variance / n).sqrt(),
            num_paths: self.count as u32,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub const MAX_NUM_PATHS: u32 = 1_000_000;
pub const MAX_TIME_STEPS: u32 = 10_000;
/// Cap on `num_paths * time_steps`, the number of normal draws per leg
/// (twice that for stochastic-vol paths).
pub const MAX_PATH_STEPS: u64 = 50_000_000;

fn validate_simulation(req: &PricingRequest, params: &PricingParams) -> RiskCurveResult<()> {
    if params.num_paths < 2 {
        return Err(RiskCurveError::InvalidInput {
            field: "num_paths".into(),
            reason: "Must be at least 2".into(),
        });
    }
    if params.num_paths > MAX_NUM_PATHS {
        return Err(RiskCurveError::InvalidInput {
            field: "num_paths".into(),
            reason: format!("Must not exceed {MAX_NUM_PATHS}"),
        });
    }
    if params.time_steps == 0 {
        return Err(RiskCurveError::InvalidInput {
            field: "time_steps".into(),
            reason: "Must have at least 1 time step".into(),
        });
    }
    if params.time_steps > MAX_TIME_STEPS {
        return Err(RiskCurveError::InvalidInput {
            field: "time_steps".into(),
            reason: format!("Must not exceed {MAX_TIME_STEPS}"),
        });
    }
    if u64::from(params.num_paths) * u64::from(params.time_steps) > MAX_PATH_STEPS {
        return Err(RiskCurveError::InvalidInput {
            field: "num_paths".into(),
            reason: format!("num_paths * time_steps must not exceed {MAX_PATH_STEPS}"),
        });
    }
    if !(req.spot > 0.0) || !req.spot.is_finite() {
        return Err(RiskCurveError::InvalidInput {
            field: "spot".into(),
            reason: "must be positive".into(),
        });
    }
    if !(req.strike > 0.0) || !req.strike.is_finite() {
        return Err(RiskCurveError::InvalidInput {
            field: "strike".into(),
            reason: "must be positive".into(),
        });
    }
    if !(req.volatility >= 0.0) || !req.volatility.is_finite() {
        return Err(RiskCurveError::InvalidInput {
            field: "volatility".into(),
            reason: "must be non-negative".into(),
        });
    }
    Ok(())
}

fn standard_normal() -> RiskCurveResult<Normal> {
    Normal::new(0.0, 1.0).map_err(|e| RiskCurveError::InvalidInput {
        field: "distribution".into(),
        reason: format!("Invalid Normal parameters: {e}"),
    })
}

fn expired(req: &PricingRequest, params: &PricingParams) -> SimulationResult {
    SimulationResult {
        price: intrinsic_value(req.spot, req.strike, req.right),
        std_error: 0.0,
        num_paths: params.num_paths,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Lognormal paths: log-Euler steps of constant-vol drift-diffusion under the
/// risk-neutral measure. Deterministic for a given `params.seed`.
pub fn simulate_lognormal(
    req: &PricingRequest,
    params: &PricingParams,
) -> RiskCurveResult<SimulationResult> {
    validate_simulation(req, params)?;
    if req.time_to_expiry <= 0.0 {
        return Ok(expired(req, params));
    }

    let normal = standard_normal()?;
    let mut rng = StdRng::seed_from_u64(params.seed);

    let t = req.time_to_expiry;
    let r = req.risk_free_rate;
    let sigma = req.volatility;
    let dt = t / params.time_steps as f64;
    let drift = (r - 0.5 * sigma * sigma) * dt;
    let diffusion = sigma * dt.sqrt();

    let mut stats = PayoffStats::default();
    for _ in 0..params.num_paths {
        let mut log_s = req.spot.ln();
        for _ in 0..params.time_steps {
            let z: f64 = rng.sample(&normal);
            log_s += drift + diffusion * z;
        }
        stats.push(intrinsic_value(log_s.exp(), req.strike, req.right));
    }

    Ok(stats.finish((-r * t).exp()))
}

/// Coupled price/variance paths (Heston dynamics, Euler scheme).
///
/// Variance starts at and reverts to `volatility^2` with speed
/// `mean_reversion`; `vol_of_vol` scales the variance shock and
/// `correlation` couples it to the price shock. Negative variance after a
/// step is reflected back to its absolute value.
pub fn simulate_stochastic_vol(
    req: &PricingRequest,
    params: &PricingParams,
) -> RiskCurveResult<SimulationResult> {
    validate_simulation(req, params)?;
    if req.time_to_expiry <= 0.0 {
        return Ok(expired(req, params));
    }

    let normal = standard_normal()?;
    let mut rng = StdRng::seed_from_u64(params.seed);

    let t = req.time_to_expiry;
    let r = req.risk_free_rate;
    let v0 = req.volatility * req.volatility;
    let long_run = v0;
    let kappa = params.mean_reversion.max(0.0);
    let xi = params.vol_of_vol.max(0.0);
    let rho = params.correlation.clamp(-1.0, 1.0);
    let rho_perp = (1.0 - rho * rho).sqrt();
    let dt = t / params.time_steps as f64;
    let sqrt_dt = dt.sqrt();

    let mut stats = PayoffStats::default();
    for _ in 0..params.num_paths {
        let mut log_s = req.spot.ln();
        let mut v = v0;
        for _ in 0..params.time_steps {
            let z1: f64 = rng.sample(&normal);
            let z2: f64 = rng.sample(&normal);
            let zs = rho * z1 + rho_perp * z2;
            let sqrt_v = v.sqrt();

            log_s += (r - 0.5 * v) * dt + sqrt_v * sqrt_dt * zs;
            v = (v + kappa * (long_run - v) * dt + xi * sqrt_v * sqrt_dt * z1).abs();
        }
        stats.push(intrinsic_value(log_s.exp(), req.strike, req.right));
    }

    Ok(stats.finish((-r * t).exp()))
}
