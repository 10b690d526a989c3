use crate::pricing::normal::{norm_cdf, norm_pdf};
use crate::pricing::{OptionGreeks, OptionRight, PricingRequest};
use crate::types::{Rate, Years};

/// Shortest time a closed-form formula is ever evaluated at (~12 hours).
pub const MIN_PRICING_YEARS: Years = 1.0 / 730.0;

/// Below ~30 minutes to expiry the Greeks snap to their boundary values.
pub const GREEKS_CUTOFF_YEARS: Years = 30.0 / (365.0 * 24.0 * 60.0);

/// Volatility below which the lognormal density degenerates.
pub const MIN_VOLATILITY: Rate = 1e-8;

pub const DAYS_PER_YEAR: f64 = 365.0;

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

struct BsParams {
    d1: f64,
    d2: f64,
    sigma_sqrt_t: f64,
    exp_neg_rt: f64,
}

fn compute_bs_params(s: f64, k: f64, t: f64, r: f64, sigma: f64) -> BsParams {
    let sigma_sqrt_t = sigma * t.sqrt();
    let d1 = ((s / k).ln() + (r + 0.5 * sigma * sigma) * t) / sigma_sqrt_t;
    BsParams {
        d1,
        d2: d1 - sigma_sqrt_t,
        sigma_sqrt_t,
        exp_neg_rt: (-r * t).exp(),
    }
}

/// Inputs for which the lognormal formula is well defined.
fn is_regular(req: &PricingRequest) -> bool {
    req.spot > 0.0
        && req.strike > 0.0
        && req.time_to_expiry > 0.0
        && req.volatility >= MIN_VOLATILITY
        && req.spot.is_finite()
        && req.strike.is_finite()
        && req.risk_free_rate.is_finite()
        && req.volatility.is_finite()
}

pub fn intrinsic_value(spot: f64, strike: f64, right: OptionRight) -> f64 {
    match right {
        OptionRight::Call => (spot - strike).max(0.0),
        OptionRight::Put => (strike - spot).max(0.0),
    }
}

/// Boundary price when the formula cannot be evaluated: intrinsic at or
/// past expiry, otherwise intrinsic against the discounted strike (the
/// zero-vol limit).
fn boundary_price(req: &PricingRequest) -> f64 {
    let spot = req.spot.max(0.0);
    let strike = req.strike.max(0.0);
    if !(req.time_to_expiry > 0.0) || !req.risk_free_rate.is_finite() {
        return intrinsic_value(spot, strike, req.right);
    }
    let discounted = strike * (-req.risk_free_rate * req.time_to_expiry).exp();
    intrinsic_value(spot, discounted, req.right)
}

/// Delta pinned to 1 / -1 in the money, 0 otherwise; gamma and theta zero.
pub fn boundary_greeks(spot: f64, strike: f64, right: OptionRight) -> OptionGreeks {
    let delta = match right {
        OptionRight::Call if spot > strike => 1.0,
        OptionRight::Put if spot < strike => -1.0,
        _ => 0.0,
    };
    OptionGreeks {
        delta,
        gamma: 0.0,
        theta: 0.0,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Black-Scholes price. Expired (T <= 0) prices at exactly intrinsic.
pub fn price(req: &PricingRequest) -> f64 {
    if !is_regular(req) {
        return boundary_price(req);
    }
    let s = req.spot;
    let k = req.strike;
    let p = compute_bs_params(s, k, req.time_to_expiry, req.risk_free_rate, req.volatility);
    let value = match req.right {
        OptionRight::Call => s * norm_cdf(p.d1) - k * p.exp_neg_rt * norm_cdf(p.d2),
        OptionRight::Put => k * p.exp_neg_rt * norm_cdf(-p.d2) - s * norm_cdf(-p.d1),
    };
    // The CDF approximation can leave a tiny negative for deep OTM strikes.
    value.max(0.0)
}

/// Delta, gamma and per-day theta.
pub fn greeks(req: &PricingRequest) -> OptionGreeks {
    if req.time_to_expiry < GREEKS_CUTOFF_YEARS || !is_regular(req) {
        return boundary_greeks(req.spot, req.strike, req.right);
    }

    let s = req.spot;
    let k = req.strike;
    let t = req.time_to_expiry;
    let r = req.risk_free_rate;
    let p = compute_bs_params(s, k, t, r, req.volatility);
    let nd1 = norm_pdf(p.d1);

    let delta = match req.right {
        OptionRight::Call => norm_cdf(p.d1),
        OptionRight::Put => norm_cdf(p.d1) - 1.0,
    };

    let gamma = nd1 / (s * p.sigma_sqrt_t);

    // d(sigma*sqrt(T))/dT = sigma / (2 sqrt(T)) = sigma_sqrt_t / (2T)
    let decay = -s * nd1 * p.sigma_sqrt_t / (2.0 * t);
    let theta_annual = match req.right {
        OptionRight::Call => decay - r * k * p.exp_neg_rt * norm_cdf(p.d2),
        OptionRight::Put => decay + r * k * p.exp_neg_rt * norm_cdf(-p.d2),
    };

    OptionGreeks {
        delta,
        gamma,
        theta: theta_annual / DAYS_PER_YEAR,
    }
}

/// Raw vega (dV/dsigma, not scaled per vol point).
pub fn vega(req: &PricingRequest) -> f64 {
    if !is_regular(req) {
        return 0.0;
    }
    let p = compute_bs_params(
        req.spot,
        req.strike,
        req.time_to_expiry,
        req.risk_free_rate,
        req.volatility,
    );
    req.spot * norm_pdf(p.d1) * req.time_to_expiry.sqrt()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
