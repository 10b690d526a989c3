use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Named market-condition preset selecting the skew parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketRegime {
    LowVol,
    #[default]
    Normal,
    Elevated,
    Panic,
}

/// Skew parameters for one regime.
///
/// `put_skew` and `call_skew` are IV changes (as a fraction of base vol) per
/// 10% of out-of-the-money distance; `atm_boost` lifts the at-the-money
/// region only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegimeConfig {
    pub name: &'static str,
    pub typical_vol_range: (f64, f64),
    pub put_skew: f64,
    pub call_skew: f64,
    pub atm_boost: f64,
}

// Indexed by `MarketRegime as usize`.
static REGIME_TABLE: [RegimeConfig; 4] = [
    RegimeConfig {
        name: "low_vol",
        typical_vol_range: (0.0, 0.15),
        put_skew: 0.06,
        call_skew: -0.02,
        atm_boost: 0.0,
    },
    RegimeConfig {
        name: "normal",
        typical_vol_range: (0.15, 0.22),
        put_skew: 0.10,
        call_skew: -0.03,
        atm_boost: 0.02,
    },
    RegimeConfig {
        name: "elevated",
        typical_vol_range: (0.22, 0.32),
        put_skew: 0.15,
        call_skew: -0.02,
        atm_boost: 0.05,
    },
    RegimeConfig {
        name: "panic",
        typical_vol_range: (0.32, 1.50),
        put_skew: 0.22,
        call_skew: 0.04,
        atm_boost: 0.10,
    },
];

impl MarketRegime {
    pub const ALL: [MarketRegime; 4] = [
        MarketRegime::LowVol,
        MarketRegime::Normal,
        MarketRegime::Elevated,
        MarketRegime::Panic,
    ];

    pub fn config(self) -> &'static RegimeConfig {
        &REGIME_TABLE[self as usize]
    }

    /// Pick the regime whose typical vol range contains `base_vol`.
    /// Anything above the last range is treated as panic; non-finite input
    /// falls back to the default regime.
    pub fn classify(base_vol: f64) -> MarketRegime {
        if !base_vol.is_finite() {
            return MarketRegime::default();
        }
        Self::ALL
            .into_iter()
            .find(|r| {
                let (lo, hi) = r.config().typical_vol_range;
                base_vol >= lo && base_vol < hi
            })
            .unwrap_or(if base_vol < 0.0 {
                MarketRegime::LowVol
            } else {
                MarketRegime::Panic
            })
    }
}

/// The full regime table, in `MarketRegime::ALL` order.
pub fn regime_table() -> &'static [RegimeConfig] {
    &REGIME_TABLE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_lookup_matches_enum_order() {
        for regime in MarketRegime::ALL {
            let name = serde_json::to_value(regime).unwrap();
            assert_eq!(name, regime.config().name);
        }
    }

    #[test]
    fn test_ranges_are_contiguous() {
        let table = regime_table();
        for pair in table.windows(2) {
            assert_eq!(pair[0].typical_vol_range.1, pair[1].typical_vol_range.0);
        }
    }

    #[test]
    fn test_put_skew_steepens_with_stress() {
        let low = MarketRegime::LowVol.config().put_skew;
        let panic = MarketRegime::Panic.config().put_skew;
        assert!(panic > low);
    }

    #[test]
    fn test_classify() {
        assert_eq!(MarketRegime::classify(0.11), MarketRegime::LowVol);
        assert_eq!(MarketRegime::classify(0.18), MarketRegime::Normal);
        assert_eq!(MarketRegime::classify(0.25), MarketRegime::Elevated);
        assert_eq!(MarketRegime::classify(0.60), MarketRegime::Panic);
        assert_eq!(MarketRegime::classify(4.0), MarketRegime::Panic);
        assert_eq!(MarketRegime::classify(f64::NAN), MarketRegime::Normal);
    }
}
