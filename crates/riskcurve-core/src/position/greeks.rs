use chrono::NaiveDateTime;

use crate::position::evaluator::{leg_request, PricingContext};
use crate::position::types::Strategy;
use crate::pricing::black_scholes::{boundary_greeks, GREEKS_CUTOFF_YEARS};
use crate::pricing::{model_greeks, OptionGreeks};
use crate::types::CONTRACT_MULTIPLIER;

/// Position Greeks of one strategy at `price`, in dollars per point
/// (delta, gamma) and dollars per day (theta).
///
/// Expired legs contribute nothing. Legs inside the last half hour take the
/// boundary values; everything else comes from the curve model at the
/// leg's skewed vol.
pub fn strategy_greeks(
    strategy: &Strategy,
    price: f64,
    reference_spot: f64,
    valuation: NaiveDateTime,
    ctx: &PricingContext,
) -> OptionGreeks {
    let mut total = OptionGreeks::zero();

    for leg in &strategy.legs {
        let (req, real) = leg_request(leg, price, reference_spot, valuation, ctx);
        if real <= 0.0 {
            continue;
        }
        let per_contract = if real < GREEKS_CUTOFF_YEARS {
            boundary_greeks(req.spot, req.strike, req.right)
        } else {
            model_greeks(ctx.pricing, &req)
        };

        let q = leg.quantity as f64;
        let direction = q.signum();
        total += OptionGreeks {
            delta: per_contract.delta * q,
            gamma: per_contract.gamma * q.abs() * direction,
            theta: per_contract.theta * q,
        };
    }

    total.scale(CONTRACT_MULTIPLIER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::evaluator::DEFAULT_CALENDAR_VOLATILITY;
    use crate::position::types::Leg;
    use crate::pricing::{OptionRight, PricingParams};
    use crate::volatility::MarketRegime;
    use chrono::NaiveDate;

    fn expiry() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 21).unwrap()
    }

    fn single(right: OptionRight, quantity: i32) -> Strategy {
        Strategy {
            id: "g".into(),
            symbol: String::new(),
            visible: true,
            cost_basis: 0.0,
            legs: vec![Leg {
                strike: 6000.0,
                expiration: expiry(),
                right,
                quantity,
            }],
            shape: None,
            primary_expiration: expiry(),
        }
    }

    fn greeks_at(strategy: &Strategy, valuation: NaiveDateTime) -> OptionGreeks {
        let pricing = PricingParams::default();
        let ctx = PricingContext {
            regime: MarketRegime::Normal.config(),
            pricing: &pricing,
            base_volatility: 0.18,
            risk_free_rate: 0.05,
            calendar_volatility: DEFAULT_CALENDAR_VOLATILITY,
        };
        strategy_greeks(strategy, 6010.0, 6010.0, valuation, &ctx)
    }

    fn month_before() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 2, 21)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_short_position_flips_every_sign() {
        let long = greeks_at(&single(OptionRight::Call, 2), month_before());
        let short = greeks_at(&single(OptionRight::Call, -2), month_before());
        assert!(long.delta > 0.0 && long.gamma > 0.0 && long.theta < 0.0);
        assert!((long.delta + short.delta).abs() < 1e-9);
        assert!((long.gamma + short.gamma).abs() < 1e-12);
        assert!((long.theta + short.theta).abs() < 1e-9);
    }

    #[test]
    fn test_scaled_by_contract_multiplier() {
        let g = greeks_at(&single(OptionRight::Put, 1), month_before());
        assert!(g.delta < 0.0 && g.delta > -100.0);
    }

    #[test]
    fn test_last_half_hour_uses_boundary_values() {
        let valuation = expiry().and_hms_opt(15, 45, 0).unwrap();
        let g = greeks_at(&single(OptionRight::Call, 3), valuation);
        assert_eq!(
            g,
            OptionGreeks {
                delta: 300.0,
                gamma: 0.0,
                theta: 0.0
            }
        );
    }

    #[test]
    fn test_expired_legs_contribute_nothing() {
        let valuation = expiry().and_hms_opt(16, 5, 0).unwrap();
        let g = greeks_at(&single(OptionRight::Call, 3), valuation);
        assert_eq!(g, OptionGreeks::zero());
    }
}
