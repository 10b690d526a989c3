use riskcurve_core::pricing::black_scholes;
use riskcurve_core::pricing::valuation::{ImpliedVolInput, OptionValuationInput};
use riskcurve_core::pricing::{OptionRight, PricingModel, PricingParams, PricingRequest};
use riskcurve_core::volatility::{regime_table, skewed_volatility, MarketRegime};
use riskcurve_core::{implied_volatility, value_option, RiskCurveError};

fn spx_call() -> OptionValuationInput {
    OptionValuationInput {
        spot_price: 6000.0,
        strike_price: 6050.0,
        time_to_expiry: 30.0 / 365.0,
        risk_free_rate: 0.045,
        volatility: 0.16,
        right: OptionRight::Call,
        pricing: PricingParams::default(),
    }
}

// ===========================================================================
// Closed form
// ===========================================================================

#[test]
fn test_put_call_parity_through_value_option() {
    for strike in [5500.0, 5900.0, 6000.0, 6050.0, 6600.0] {
        let call = value_option(&OptionValuationInput {
            strike_price: strike,
            ..spx_call()
        })
        .unwrap();
        let put = value_option(&OptionValuationInput {
            strike_price: strike,
            right: OptionRight::Put,
            ..spx_call()
        })
        .unwrap();
        let t: f64 = 30.0 / 365.0;
        let forward_gap = 6000.0 - strike * (-0.045 * t).exp();
        assert!(
            (call.result.price - put.result.price - forward_gap).abs() < 1e-6,
            "parity at K={strike}"
        );
    }
}

#[test]
fn test_prices_respect_bounds() {
    for vol in [0.05, 0.2, 0.8, 2.5] {
        for strike in [3000.0, 6000.0, 9000.0] {
            let call = PricingRequest {
                spot: 6000.0,
                strike,
                time_to_expiry: 0.25,
                risk_free_rate: 0.05,
                volatility: vol,
                right: OptionRight::Call,
            };
            let put = PricingRequest {
                right: OptionRight::Put,
                ..call
            };
            let c = black_scholes::price(&call);
            let p = black_scholes::price(&put);
            assert!((0.0..=6000.0).contains(&c));
            assert!((0.0..=strike).contains(&p));
        }
    }
}

#[test]
fn test_near_expiry_greeks_snap_to_boundary() {
    let req = PricingRequest {
        spot: 6010.0,
        strike: 6000.0,
        time_to_expiry: 5.0 / (365.0 * 24.0 * 60.0),
        risk_free_rate: 0.05,
        volatility: 0.16,
        right: OptionRight::Call,
    };
    let g = black_scholes::greeks(&req);
    assert_eq!((g.delta, g.gamma, g.theta), (1.0, 0.0, 0.0));
}

// ===========================================================================
// Model selection
// ===========================================================================

#[test]
fn test_stochastic_vol_prices_otm_differently() {
    let bs = value_option(&spx_call()).unwrap();
    let sv = value_option(&OptionValuationInput {
        pricing: PricingParams::with_model(PricingModel::StochasticVolAnalytic),
        ..spx_call()
    })
    .unwrap();
    assert!(sv.result.greeks.is_some());
    assert!((sv.result.price - bs.result.price).abs() > 1e-6);
    assert_eq!(sv.methodology, "Stochastic-vol smile approximation");
}

#[cfg(feature = "simulation")]
#[test]
fn test_simulated_valuation_is_seeded() {
    let input = OptionValuationInput {
        pricing: PricingParams {
            num_paths: 5_000,
            time_steps: 8,
            seed: 2024,
            ..PricingParams::with_model(PricingModel::MonteCarloStochasticVol)
        },
        ..spx_call()
    };
    let a = value_option(&input).unwrap();
    let b = value_option(&input).unwrap();
    assert_eq!(a.result.price, b.result.price);
    assert!(a.result.greeks.is_none());
    let se = a.result.std_error.unwrap();
    assert!(se > 0.0);
}

#[cfg(feature = "simulation")]
#[test]
fn test_simulated_lognormal_close_to_closed_form() {
    let bs = value_option(&spx_call()).unwrap().result.price;
    let mc = value_option(&OptionValuationInput {
        pricing: PricingParams {
            num_paths: 40_000,
            time_steps: 4,
            ..PricingParams::with_model(PricingModel::MonteCarloLognormal)
        },
        ..spx_call()
    })
    .unwrap()
    .result;
    let se = mc.std_error.unwrap();
    assert!((mc.price - bs).abs() < 4.0 * se, "mc {} bs {bs} se {se}", mc.price);
}

// ===========================================================================
// Implied volatility
// ===========================================================================

#[test]
fn test_implied_vol_recovers_input_vol() {
    let priced = value_option(&OptionValuationInput {
        volatility: 0.27,
        right: OptionRight::Put,
        strike_price: 5800.0,
        ..spx_call()
    })
    .unwrap();
    let iv = implied_volatility(&ImpliedVolInput {
        spot_price: 6000.0,
        strike_price: 5800.0,
        time_to_expiry: 30.0 / 365.0,
        risk_free_rate: 0.045,
        right: OptionRight::Put,
        market_price: priced.result.price,
    })
    .unwrap();
    assert!((iv.result.implied_vol - 0.27).abs() < 1e-6);
    assert!(iv.result.iterations <= 100);
}

#[test]
fn test_implied_vol_rejects_price_above_spot() {
    let err = implied_volatility(&ImpliedVolInput {
        spot_price: 6000.0,
        strike_price: 6000.0,
        time_to_expiry: 0.1,
        risk_free_rate: 0.045,
        right: OptionRight::Call,
        market_price: 6500.0,
    })
    .unwrap_err();
    assert!(matches!(err, RiskCurveError::InvalidInput { .. }));
}

// ===========================================================================
// Skew and regimes
// ===========================================================================

#[test]
fn test_skew_neutral_at_the_money() {
    for regime in MarketRegime::ALL {
        let cfg = regime.config();
        let iv = skewed_volatility(0.18, 6000.0, 6000.0, cfg);
        assert!((iv - 0.18 * (1.0 + cfg.atm_boost)).abs() < 1e-12);
    }
}

#[test]
fn test_put_wing_richer_than_call_wing() {
    for regime in MarketRegime::ALL {
        let cfg = regime.config();
        let put_wing = skewed_volatility(0.18, 5400.0, 6000.0, cfg);
        let call_wing = skewed_volatility(0.18, 6600.0, 6000.0, cfg);
        assert!(put_wing > call_wing, "{}", cfg.name);
    }
}

#[test]
fn test_regime_table_covers_all_regimes() {
    let table = regime_table();
    assert_eq!(table.len(), 4);
    assert_eq!(MarketRegime::classify(0.12), MarketRegime::LowVol);
    assert_eq!(MarketRegime::classify(0.45), MarketRegime::Panic);
}
