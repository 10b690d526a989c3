use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::RiskCurveError;
use crate::position::types::Leg;
use crate::pricing::black_scholes::intrinsic_value;
use crate::pricing::OptionRight;
use crate::RiskCurveResult;

/// Fixed strategy shapes from the older position format, strikes already
/// converted to f64.
///
/// Every shape expands to an ordinary leg list and is evaluated through the
/// leg path. The shape itself is kept for two things: its value bounds,
/// which cap theoretical values, and [`LegacyShape::reference_payoff`],
/// the closed-form expiry payoff used to check the leg path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum LegacyShape {
    Single {
        strike: f64,
        right: OptionRight,
        quantity: i32,
    },
    Vertical {
        long_strike: f64,
        short_strike: f64,
        right: OptionRight,
        quantity: u32,
    },
    Butterfly {
        lower_strike: f64,
        middle_strike: f64,
        upper_strike: f64,
        right: OptionRight,
        quantity: u32,
    },
}

/// Wing widths may differ by this much and still count as symmetric.
const WING_TOLERANCE: f64 = 1e-9;

fn zero_quantity() -> RiskCurveError {
    RiskCurveError::InvalidInput {
        field: "quantity".into(),
        reason: "Quantity must be non-zero".into(),
    }
}

fn leg(strike: f64, expiration: NaiveDate, right: OptionRight, quantity: i32) -> Leg {
    Leg {
        strike,
        expiration,
        right,
        quantity,
    }
}

impl LegacyShape {
    /// Equivalent leg list, all legs expiring on `expiration`.
    pub fn legs(&self, expiration: NaiveDate) -> RiskCurveResult<Vec<Leg>> {
        match *self {
            LegacyShape::Single {
                strike,
                right,
                quantity,
            } => {
                if quantity == 0 {
                    return Err(zero_quantity());
                }
                Ok(vec![leg(strike, expiration, right, quantity)])
            }
            LegacyShape::Vertical {
                long_strike,
                short_strike,
                right,
                quantity,
            } => {
                let n = spread_quantity(quantity)?;
                if long_strike == short_strike {
                    return Err(RiskCurveError::InvalidInput {
                        field: "short_strike".into(),
                        reason: "Vertical spread strikes must differ".into(),
                    });
                }
                Ok(vec![
                    leg(long_strike, expiration, right, n),
                    leg(short_strike, expiration, right, -n),
                ])
            }
            LegacyShape::Butterfly {
                lower_strike,
                middle_strike,
                upper_strike,
                right,
                quantity,
            } => {
                let n = spread_quantity(quantity)?;
                if !(lower_strike < middle_strike && middle_strike < upper_strike) {
                    return Err(RiskCurveError::InvalidInput {
                        field: "middle_strike".into(),
                        reason: "Butterfly strikes must be strictly increasing".into(),
                    });
                }
                let lower_wing = middle_strike - lower_strike;
                let upper_wing = upper_strike - middle_strike;
                if (lower_wing - upper_wing).abs() > WING_TOLERANCE * middle_strike {
                    return Err(RiskCurveError::InvalidInput {
                        field: "upper_strike".into(),
                        reason: "Butterfly wings must be symmetric".into(),
                    });
                }
                let body = n.checked_mul(2).ok_or_else(|| RiskCurveError::InvalidInput {
                    field: "quantity".into(),
                    reason: "Quantity too large".into(),
                })?;
                Ok(vec![
                    leg(lower_strike, expiration, right, n),
                    leg(middle_strike, expiration, right, -body),
                    leg(upper_strike, expiration, right, n),
                ])
            }
        }
    }

    /// Per-share value of the shape at expiry, written from the shape's own
    /// payoff formula rather than by summing legs.
    pub fn reference_payoff(&self, spot: f64) -> f64 {
        match *self {
            LegacyShape::Single {
                strike,
                right,
                quantity,
            } => quantity as f64 * intrinsic_value(spot, strike, right),
            LegacyShape::Vertical {
                long_strike,
                short_strike,
                right,
                quantity,
            } => {
                // Distance from the long strike into the money, capped at the
                // width. A credit spread (long strike further out) mirrors it.
                let width = (long_strike - short_strike).abs();
                let debit = match right {
                    OptionRight::Call => long_strike < short_strike,
                    OptionRight::Put => long_strike > short_strike,
                };
                let into_money = |k: f64| match right {
                    OptionRight::Call => spot - k,
                    OptionRight::Put => k - spot,
                };
                let per_spread = if debit {
                    into_money(long_strike).clamp(0.0, width)
                } else {
                    -into_money(short_strike).clamp(0.0, width)
                };
                quantity as f64 * per_spread
            }
            LegacyShape::Butterfly {
                lower_strike,
                middle_strike,
                quantity,
                ..
            } => {
                // Symmetric tent peaking at the body, same for calls and puts.
                let wing = middle_strike - lower_strike;
                quantity as f64 * (wing - (spot - middle_strike).abs()).max(0.0)
            }
        }
    }

    /// Smallest and largest per-share value the shape can be worth. Either
    /// side may be infinite (long or short single call).
    pub fn value_bounds(&self) -> (f64, f64) {
        match *self {
            LegacyShape::Single {
                strike,
                right,
                quantity,
            } => {
                let q = quantity as f64;
                let cap = match right {
                    OptionRight::Call => f64::INFINITY,
                    OptionRight::Put => strike,
                };
                if quantity > 0 {
                    (0.0, q * cap)
                } else {
                    (q * cap, 0.0)
                }
            }
            LegacyShape::Vertical {
                long_strike,
                short_strike,
                right,
                quantity,
            } => {
                let signed_width = match right {
                    OptionRight::Call => short_strike - long_strike,
                    OptionRight::Put => long_strike - short_strike,
                };
                let q = quantity as f64;
                (q * signed_width.min(0.0), q * signed_width.max(0.0))
            }
            LegacyShape::Butterfly {
                lower_strike,
                middle_strike,
                quantity,
                ..
            } => (0.0, quantity as f64 * (middle_strike - lower_strike)),
        }
    }

    /// Clamp a per-share value into [`LegacyShape::value_bounds`].
    pub fn clamp_value(&self, value: f64) -> f64 {
        let (lo, hi) = self.value_bounds();
        value.max(lo).min(hi)
    }
}

fn spread_quantity(quantity: u32) -> RiskCurveResult<i32> {
    if quantity == 0 {
        return Err(zero_quantity());
    }
    i32::try_from(quantity).map_err(|_| RiskCurveError::InvalidInput {
        field: "quantity".into(),
        reason: "Quantity too large".into(),
    })
}
