use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::RiskCurveError;
use crate::position::legacy::LegacyShape;
use crate::pricing::OptionRight;
use crate::types::*;
use crate::RiskCurveResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// One option leg as held in the position store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionLeg {
    pub strike: Money,
    pub expiration: NaiveDate,
    pub right: OptionRight,
    /// Signed contracts: positive long, negative short.
    pub quantity: i32,
}

/// How a stored strategy describes its legs. Legacy fixed shapes are
/// expanded into leg lists by [`Strategy::from_input`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum StrategyStructure {
    Legs {
        legs: Vec<PositionLeg>,
    },
    Single {
        strike: Money,
        expiration: NaiveDate,
        right: OptionRight,
        #[serde(default = "default_single_quantity")]
        quantity: i32,
    },
    /// Long `long_strike`, short `short_strike`, same right.
    Vertical {
        long_strike: Money,
        short_strike: Money,
        expiration: NaiveDate,
        right: OptionRight,
        #[serde(default = "default_spread_quantity")]
        quantity: u32,
    },
    /// Long 1 lower / short 2 middle / long 1 upper, symmetric wings.
    Butterfly {
        lower_strike: Money,
        middle_strike: Money,
        upper_strike: Money,
        expiration: NaiveDate,
        right: OptionRight,
        #[serde(default = "default_spread_quantity")]
        quantity: u32,
    },
}

fn default_single_quantity() -> i32 {
    1
}

fn default_spread_quantity() -> u32 {
    1
}

fn default_visible() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyInput {
    pub id: String,
    /// Underlying symbol; empty means the primary underlying.
    #[serde(default)]
    pub symbol: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Per-share net debit for the whole position. Negative for a credit.
    pub cost_basis: Money,
    #[serde(flatten)]
    pub structure: StrategyStructure,
}

// ---------------------------------------------------------------------------
// Normalized form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Leg {
    pub strike: f64,
    pub expiration: NaiveDate,
    pub right: OptionRight,
    pub quantity: i32,
}

/// A strategy as the evaluator sees it: f64 strikes, a non-empty leg list,
/// and the legacy shape (if any) kept for payoff-bound clamping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Strategy {
    pub id: String,
    pub symbol: String,
    pub visible: bool,
    pub cost_basis: f64,
    pub legs: Vec<Leg>,
    pub shape: Option<LegacyShape>,
    /// Earliest leg expiration.
    pub primary_expiration: NaiveDate,
}

fn money_to_f64(value: Money, field: &str) -> RiskCurveResult<f64> {
    value.to_f64().ok_or_else(|| RiskCurveError::InvalidInput {
        field: field.into(),
        reason: format!("{value} is not representable as f64"),
    })
}

fn positive_strike(value: Money, field: &str) -> RiskCurveResult<f64> {
    let strike = money_to_f64(value, field)?;
    if !(strike > 0.0) {
        return Err(RiskCurveError::InvalidInput {
            field: field.into(),
            reason: "Strike must be positive".into(),
        });
    }
    Ok(strike)
}

impl Strategy {
    pub fn from_input(input: &StrategyInput) -> RiskCurveResult<Strategy> {
        let cost_basis = money_to_f64(input.cost_basis, "cost_basis")?;

        let (legs, shape) = match &input.structure {
            StrategyStructure::Legs { legs } => {
                if legs.is_empty() {
                    return Err(RiskCurveError::InvalidInput {
                        field: "legs".into(),
                        reason: "Strategy must have at least one leg".into(),
                    });
                }
                let mut out = Vec::with_capacity(legs.len());
                for (i, leg) in legs.iter().enumerate() {
                    if leg.quantity == 0 {
                        return Err(RiskCurveError::InvalidInput {
                            field: format!("legs[{i}].quantity"),
                            reason: "Quantity must be non-zero".into(),
                        });
                    }
                    out.push(Leg {
                        strike: positive_strike(leg.strike, &format!("legs[{i}].strike"))?,
                        expiration: leg.expiration,
                        right: leg.right,
                        quantity: leg.quantity,
                    });
                }
                (out, None)
            }
            StrategyStructure::Single {
                strike,
                expiration,
                right,
                quantity,
            } => {
                let shape = LegacyShape::Single {
                    strike: positive_strike(*strike, "strike")?,
                    right: *right,
                    quantity: *quantity,
                };
                (shape.legs(*expiration)?, Some(shape))
            }
            StrategyStructure::Vertical {
                long_strike,
                short_strike,
                expiration,
                right,
                quantity,
            } => {
                let shape = LegacyShape::Vertical {
                    long_strike: positive_strike(*long_strike, "long_strike")?,
                    short_strike: positive_strike(*short_strike, "short_strike")?,
                    right: *right,
                    quantity: *quantity,
                };
                (shape.legs(*expiration)?, Some(shape))
            }
            StrategyStructure::Butterfly {
                lower_strike,
                middle_strike,
                upper_strike,
                expiration,
                right,
                quantity,
            } => {
                let shape = LegacyShape::Butterfly {
                    lower_strike: positive_strike(*lower_strike, "lower_strike")?,
                    middle_strike: positive_strike(*middle_strike, "middle_strike")?,
                    upper_strike: positive_strike(*upper_strike, "upper_strike")?,
                    right: *right,
                    quantity: *quantity,
                };
                (shape.legs(*expiration)?, Some(shape))
            }
        };

        // legs is non-empty on every branch above
        let primary_expiration = legs
            .iter()
            .map(|l| l.expiration)
            .min()
            .ok_or_else(|| RiskCurveError::InvalidInput {
                field: "legs".into(),
                reason: "Strategy must have at least one leg".into(),
            })?;

        Ok(Strategy {
            id: input.id.clone(),
            symbol: input.symbol.clone(),
            visible: input.visible,
            cost_basis,
            legs,
            shape,
            primary_expiration,
        })
    }
}

/// Normalize every input, skipping (and logging) the ones that fail.
pub fn normalize_strategies(inputs: &[StrategyInput]) -> Vec<Strategy> {
    inputs
        .iter()
        .filter_map(|input| match Strategy::from_input(input) {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::warn!(strategy = %input.id, error = %e, "skipping strategy");
                None
            }
        })
        .collect()
}
