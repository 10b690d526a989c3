use chrono::NaiveDateTime;

use crate::position::time::{expiry_instant, pricing_years, years_between, years_to_expiry};
use crate::position::types::{Leg, Strategy};
use crate::pricing::black_scholes::{self, intrinsic_value};
use crate::pricing::{model_price, PricingParams, PricingRequest};
use crate::types::{Rate, Years, CONTRACT_MULTIPLIER};
use crate::volatility::{skewed_volatility, RegimeConfig};

/// Vol used for later-dated calendar legs in the expiration curve when the
/// caller does not supply one.
pub const DEFAULT_CALENDAR_VOLATILITY: Rate = 0.20;

/// Market and model state shared by every strategy in one evaluation pass.
#[derive(Debug, Clone, Copy)]
pub struct PricingContext<'a> {
    pub regime: &'a RegimeConfig,
    pub pricing: &'a PricingParams,
    /// Base vol with any scenario offset already applied.
    pub base_volatility: Rate,
    pub risk_free_rate: Rate,
    pub calendar_volatility: Rate,
}

/// A strategy whose primary expiration has passed at `valuation`.
pub fn is_expired(strategy: &Strategy, valuation: NaiveDateTime) -> bool {
    years_to_expiry(valuation, strategy.primary_expiration) <= 0.0
}

fn to_pnl(strategy: &Strategy, value: f64) -> f64 {
    (value - strategy.cost_basis) * CONTRACT_MULTIPLIER
}

// ---------------------------------------------------------------------------
// Expiration
// ---------------------------------------------------------------------------

/// Years a leg still has to run once the strategy's primary expiration has
/// closed. Zero for legs expiring with it.
fn residual_years(strategy: &Strategy, leg: &Leg) -> Years {
    if leg.expiration <= strategy.primary_expiration {
        return 0.0;
    }
    years_between(
        expiry_instant(strategy.primary_expiration),
        expiry_instant(leg.expiration),
    )
}

/// Per-share value of the legs at the primary expiration with the
/// underlying at `price`. Legs expiring later are valued with the closed
/// form over their residual time at the calendar volatility.
pub fn expiration_value(strategy: &Strategy, price: f64, ctx: &PricingContext) -> f64 {
    strategy
        .legs
        .iter()
        .map(|leg| {
            let residual = residual_years(strategy, leg);
            let value = if residual > 0.0 {
                black_scholes::price(&PricingRequest {
                    spot: price,
                    strike: leg.strike,
                    time_to_expiry: pricing_years(residual),
                    risk_free_rate: ctx.risk_free_rate,
                    volatility: ctx.calendar_volatility,
                    right: leg.right,
                })
            } else {
                intrinsic_value(price, leg.strike, leg.right)
            };
            leg.quantity as f64 * value
        })
        .sum()
}

pub fn expiration_pnl(strategy: &Strategy, price: f64, ctx: &PricingContext) -> f64 {
    to_pnl(strategy, expiration_value(strategy, price, ctx))
}

// ---------------------------------------------------------------------------
// Theoretical
// ---------------------------------------------------------------------------

/// Pricing request for one leg at `valuation`, plus the leg's real
/// (unclamped) time to expiry. The smile is sticky-strike around
/// `reference_spot`.
pub(crate) fn leg_request(
    leg: &Leg,
    price: f64,
    reference_spot: f64,
    valuation: NaiveDateTime,
    ctx: &PricingContext,
) -> (PricingRequest, Years) {
    let real = years_to_expiry(valuation, leg.expiration);
    let req = PricingRequest {
        spot: price,
        strike: leg.strike,
        time_to_expiry: pricing_years(real),
        risk_free_rate: ctx.risk_free_rate,
        volatility: skewed_volatility(ctx.base_volatility, leg.strike, reference_spot, ctx.regime),
        right: leg.right,
    };
    (req, real)
}

/// Per-share model value of the legs at `valuation`. Legacy shapes are held
/// inside their payoff bounds; leg lists are not.
pub fn theoretical_value(
    strategy: &Strategy,
    price: f64,
    reference_spot: f64,
    valuation: NaiveDateTime,
    ctx: &PricingContext,
) -> f64 {
    let raw: f64 = strategy
        .legs
        .iter()
        .map(|leg| {
            let (req, _) = leg_request(leg, price, reference_spot, valuation, ctx);
            leg.quantity as f64 * model_price(ctx.pricing, &req)
        })
        .sum();

    match &strategy.shape {
        Some(shape) => shape.clamp_value(raw),
        None => raw,
    }
}

pub fn theoretical_pnl(
    strategy: &Strategy,
    price: f64,
    reference_spot: f64,
    valuation: NaiveDateTime,
    ctx: &PricingContext,
) -> f64 {
    to_pnl(
        strategy,
        theoretical_value(strategy, price, reference_spot, valuation, ctx),
    )
}
