//! Analytic stochastic-volatility approximation.
//!
//! Rather than integrating the characteristic function of a Heston-type
//! model, the smile the model would produce is folded into a single
//! strike- and maturity-dependent volatility which is then priced with the
//! closed form:
//!
//! ```text
//! m         = ln(K / S)
//! curvature = xi^2 * T / 2
//! smile     = curvature * m^2
//! skew      = -rho * xi * sqrt(T) * m * 0.8
//! damp      = (1 - exp(-kappa * T)) * 0.3
//! sigma'    = max(eps, sigma * (1 + (smile + skew) * (1 + damp)))
//! ```
//!
//! Prices therefore carry a smile and a skew, but kappa/xi/rho do not have
//! their textbook calibration meaning: they shape sigma' and nothing else.

use crate::pricing::black_scholes::{self, MIN_VOLATILITY};
use crate::pricing::{OptionGreeks, PricingParams, PricingRequest};
use crate::types::Rate;

const SKEW_SCALE: f64 = 0.8;
const DAMPENING_SCALE: f64 = 0.3;

/// Smile/skew-adjusted volatility for one strike and maturity.
pub fn adjusted_volatility(req: &PricingRequest, params: &PricingParams) -> Rate {
    let base = req.volatility;
    if !(req.spot > 0.0) || !(req.strike > 0.0) {
        return base.max(MIN_VOLATILITY);
    }

    let t = req.time_to_expiry.max(0.0);
    let xi = params.vol_of_vol;
    let rho = params.correlation.clamp(-1.0, 1.0);
    let kappa = params.mean_reversion.max(0.0);

    let log_moneyness = (req.strike / req.spot).ln();
    let curvature = xi * xi * t / 2.0;
    let smile_effect = curvature * log_moneyness * log_moneyness;
    let skew_effect = -rho * xi * t.sqrt() * log_moneyness * SKEW_SCALE;
    let dampening = (1.0 - (-kappa * t).exp()) * DAMPENING_SCALE;

    (base * (1.0 + (smile_effect + skew_effect) * (1.0 + dampening))).max(MIN_VOLATILITY)
}

fn adjusted_request(req: &PricingRequest, params: &PricingParams) -> PricingRequest {
    PricingRequest {
        volatility: adjusted_volatility(req, params),
        ..*req
    }
}

pub fn price(req: &PricingRequest, params: &PricingParams) -> f64 {
    black_scholes::price(&adjusted_request(req, params))
}

/// Closed-form Greeks at the adjusted volatility (sticky-strike).
pub fn greeks(req: &PricingRequest, params: &PricingParams) -> OptionGreeks {
    black_scholes::greeks(&adjusted_request(req, params))
}
