use crate::types::Rate;
use crate::volatility::regime::RegimeConfig;

/// Lowest implied vol the skew model will hand to a pricer.
pub const MIN_SKEWED_VOL: Rate = 0.01;

/// Strike-specific implied volatility.
///
/// moneyness = (K - S) / S. Out-of-the-money puts pick up
/// `put_skew * |m| * 10`, out-of-the-money calls `call_skew * m * 10`, and a
/// narrow Gaussian `atm_boost * exp(-50 m^2)` lifts strikes near the money.
/// Result is `base_vol * (1 + skew + atm)`, floored at [`MIN_SKEWED_VOL`].
pub fn skewed_volatility(base_vol: Rate, strike: f64, spot: f64, regime: &RegimeConfig) -> Rate {
    if !(spot > 0.0) || !strike.is_finite() {
        return base_vol.max(MIN_SKEWED_VOL);
    }

    let moneyness = (strike - spot) / spot;
    let skew_adjustment = if moneyness < 0.0 {
        regime.put_skew * moneyness.abs() * 10.0
    } else if moneyness > 0.0 {
        regime.call_skew * moneyness * 10.0
    } else {
        0.0
    };

    let atm_factor = (-moneyness * moneyness * 50.0).exp();
    let atm_adjustment = regime.atm_boost * atm_factor;

    // f64::max discards NaN, so a poisoned base vol also lands on the floor.
    (base_vol * (1.0 + skew_adjustment + atm_adjustment)).max(MIN_SKEWED_VOL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volatility::regime::MarketRegime;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_atm_only_boost_applies() {
        let cfg = MarketRegime::Elevated.config();
        let iv = skewed_volatility(0.20, 6000.0, 6000.0, cfg);
        assert!(approx_eq(iv, 0.20 * (1.0 + cfg.atm_boost), 1e-12));
    }

    #[test]
    fn test_low_vol_atm_is_base() {
        let iv = skewed_volatility(0.20, 100.0, 100.0, MarketRegime::LowVol.config());
        assert!(approx_eq(iv, 0.20, 1e-12));
    }

    #[test]
    fn test_otm_put_richer_than_otm_call() {
        let cfg = MarketRegime::Normal.config();
        let put_side = skewed_volatility(0.18, 5400.0, 6000.0, cfg);
        let call_side = skewed_volatility(0.18, 6600.0, 6000.0, cfg);
        assert!(put_side > call_side, "put {put_side} call {call_side}");
    }

    #[test]
    fn test_put_skew_per_ten_percent() {
        let cfg = MarketRegime::LowVol.config();
        // 10% OTM put, atm_boost is zero in this regime
        let iv = skewed_volatility(0.10, 90.0, 100.0, cfg);
        assert!(approx_eq(iv, 0.10 * (1.0 + cfg.put_skew), 1e-9));
    }

    #[test]
    fn test_floor_applies() {
        let cfg = MarketRegime::Normal.config();
        // Call skew is negative in this regime; far enough OTM it would cross zero.
        let iv = skewed_volatility(0.20, 1_000_000.0, 100.0, cfg);
        assert_eq!(iv, MIN_SKEWED_VOL);
    }

    #[test]
    fn test_bad_spot_returns_base() {
        let cfg = MarketRegime::Panic.config();
        assert_eq!(skewed_volatility(0.30, 100.0, 0.0, cfg), 0.30);
        assert_eq!(skewed_volatility(0.30, 100.0, f64::NAN, cfg), 0.30);
    }
}
