use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::pricing::black_scholes::MIN_PRICING_YEARS;
use crate::types::Years;

pub const SECONDS_PER_YEAR: f64 = 365.0 * 86_400.0;

const SESSION_CLOSE_HOUR: u32 = 16;

/// Options expire at the 16:00 session close of their expiration date.
pub fn expiry_instant(expiration: NaiveDate) -> NaiveDateTime {
    let close = NaiveTime::from_hms_opt(SESSION_CLOSE_HOUR, 0, 0).unwrap_or(NaiveTime::MIN);
    expiration.and_time(close)
}

pub fn years_between(from: NaiveDateTime, to: NaiveDateTime) -> Years {
    (to - from).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_YEAR
}

/// Real, unclamped time left until `expiration` closes. Zero or negative
/// means expired.
pub fn years_to_expiry(valuation: NaiveDateTime, expiration: NaiveDate) -> Years {
    years_between(valuation, expiry_instant(expiration))
}

/// Time handed to a pricer: zero (price at intrinsic) once expired,
/// otherwise at least [`MIN_PRICING_YEARS`].
pub fn pricing_years(real: Years) -> Years {
    if real > 0.0 {
        real.max(MIN_PRICING_YEARS)
    } else {
        0.0
    }
}

/// `as_of` pushed forward by a (possibly fractional) number of days.
///
/// Offsets past the calendar's range saturate at `NaiveDateTime::MAX` or
/// `MIN`, so a far-future scenario still expires everything. NaN leaves
/// `as_of` unchanged.
pub fn scenario_instant(as_of: NaiveDateTime, offset_days: f64) -> NaiveDateTime {
    if offset_days.is_nan() {
        return as_of;
    }
    let saturated = if offset_days > 0.0 {
        NaiveDateTime::MAX
    } else {
        NaiveDateTime::MIN
    };
    let millis = (offset_days * 86_400_000.0).round();
    if millis.abs() >= i64::MAX as f64 {
        return saturated;
    }
    Duration::try_milliseconds(millis as i64)
        .and_then(|d| as_of.checked_add_signed(d))
        .unwrap_or(saturated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_expiry_is_session_close() {
        assert_eq!(expiry_instant(date(2025, 3, 21)), at(2025, 3, 21, 16, 0));
    }

    #[test]
    fn test_one_calendar_year() {
        let t = years_to_expiry(at(2025, 3, 21, 16, 0), date(2026, 3, 21));
        assert!((t - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_same_day_morning_is_active() {
        let t = years_to_expiry(at(2025, 3, 21, 10, 0), date(2025, 3, 21));
        assert!((t - 6.0 / (365.0 * 24.0)).abs() < 1e-12);
    }

    #[test]
    fn test_after_close_is_expired() {
        let t = years_to_expiry(at(2025, 3, 21, 16, 30), date(2025, 3, 21));
        assert!(t < 0.0);
        assert_eq!(pricing_years(t), 0.0);
    }

    #[test]
    fn test_pricing_years_clamps_small_positive() {
        assert_eq!(pricing_years(1e-6), MIN_PRICING_YEARS);
        assert_eq!(pricing_years(0.5), 0.5);
    }

    #[test]
    fn test_scenario_instant_fractional_days() {
        let base = at(2025, 3, 17, 9, 30);
        assert_eq!(scenario_instant(base, 1.5), at(2025, 3, 18, 21, 30));
        assert_eq!(scenario_instant(base, 0.0), base);
        assert_eq!(scenario_instant(base, f64::NAN), base);
    }

    #[test]
    fn test_scenario_instant_saturates_out_of_range() {
        let base = at(2025, 3, 17, 9, 30);
        assert_eq!(scenario_instant(base, 1e9), NaiveDateTime::MAX);
        assert_eq!(scenario_instant(base, 1e300), NaiveDateTime::MAX);
        assert_eq!(scenario_instant(base, -1e9), NaiveDateTime::MIN);
        assert_eq!(scenario_instant(base, f64::NEG_INFINITY), NaiveDateTime::MIN);
        assert!(years_to_expiry(scenario_instant(base, 1e9), date(2025, 3, 21)) < 0.0);
        assert!(years_to_expiry(scenario_instant(base, -1e9), date(2025, 3, 21)) > 0.0);
    }
}
