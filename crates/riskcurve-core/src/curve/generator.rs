use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use crate::curve::axis::{self, AxisBounds};
use crate::curve::breakeven::find_breakevens;
use crate::curve::grid::{
    build_grid, expected_move, padded_range, sort_dedup, MAX_GRID_POINTS, MIN_HORIZON_YEARS,
};
use crate::error::RiskCurveError;
use crate::position::evaluator::{
    expiration_pnl, is_expired, theoretical_pnl, PricingContext, DEFAULT_CALENDAR_VOLATILITY,
};
use crate::position::greeks::strategy_greeks;
use crate::position::time::{scenario_instant, years_to_expiry};
use crate::position::types::{normalize_strategies, Strategy, StrategyInput};
use crate::pricing::{OptionGreeks, PricingParams};
use crate::types::*;
use crate::volatility::MarketRegime;
use crate::RiskCurveResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// What-if offsets applied on top of the live market state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioOffsets {
    /// Days added to `as_of`.
    pub time_offset_days: f64,
    /// Added to the base volatility (0.05 = five vol points).
    pub volatility_offset: Rate,
    /// Added to the primary spot, in price points.
    pub spot_offset: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveConfig {
    pub grid_points: usize,
    /// Half-width of the extra points placed around each strike.
    pub kink_epsilon: f64,
    pub risk_free_rate: Rate,
    /// Vol for later-dated calendar legs on the expiration curve.
    pub calendar_volatility: Option<Rate>,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            grid_points: 250,
            kink_epsilon: 0.01,
            risk_free_rate: 0.05,
            calendar_volatility: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveInput {
    pub strategies: Vec<StrategyInput>,
    /// Live spot of the primary underlying; the price axis is in its units.
    pub spot: f64,
    /// Live spots of other underlyings, keyed by symbol.
    #[serde(default)]
    pub spots: BTreeMap<String, f64>,
    /// Annualized base vol, e.g. VIX / 100.
    pub base_volatility: Rate,
    pub as_of: NaiveDateTime,
    #[serde(default)]
    pub scenario: ScenarioOffsets,
    #[serde(default)]
    pub regime: MarketRegime,
    #[serde(default)]
    pub pricing: PricingParams,
    #[serde(default)]
    pub config: CurveConfig,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveOutput {
    pub expiration_curve: Vec<PnlPoint>,
    pub theoretical_curve: Vec<PnlPoint>,
    /// Strategies past their (simulated) expiration, at expiry values.
    pub expired_expiration_curve: Vec<PnlPoint>,
    pub expired_theoretical_curve: Vec<PnlPoint>,
    pub axis: AxisBounds,
    pub expiration_breakevens: Vec<f64>,
    pub theoretical_breakevens: Vec<f64>,
    /// Theoretical P&L of everything visible at the simulated spot.
    pub current_theoretical_pnl: f64,
    pub greeks: OptionGreeks,
    pub critical_strikes: Vec<f64>,
    pub active_strategy_ids: Vec<String>,
}

impl CurveOutput {
    /// The shape returned when there is nothing to plot.
    pub fn empty(spot: f64) -> Self {
        CurveOutput {
            expiration_curve: Vec::new(),
            theoretical_curve: Vec::new(),
            expired_expiration_curve: Vec::new(),
            expired_theoretical_curve: Vec::new(),
            axis: AxisBounds::empty(spot),
            expiration_breakevens: Vec::new(),
            theoretical_breakevens: Vec::new(),
            current_theoretical_pnl: 0.0,
            greeks: OptionGreeks::zero(),
            critical_strikes: Vec::new(),
            active_strategy_ids: Vec::new(),
        }
    }

    fn is_finite(&self) -> bool {
        let curves = [
            &self.expiration_curve,
            &self.theoretical_curve,
            &self.expired_expiration_curve,
            &self.expired_theoretical_curve,
        ];
        let ranges = [self.axis.viewport, self.axis.full_range];
        curves
            .iter()
            .flat_map(|c| c.iter())
            .all(|p| p.price.is_finite() && p.pnl.is_finite())
            && ranges.iter().all(|r| {
                r.price_min.is_finite()
                    && r.price_max.is_finite()
                    && r.pnl_min.is_finite()
                    && r.pnl_max.is_finite()
            })
            && self
                .expiration_breakevens
                .iter()
                .chain(&self.theoretical_breakevens)
                .all(|b| b.is_finite())
            && self.current_theoretical_pnl.is_finite()
            && self.greeks.delta.is_finite()
            && self.greeks.gamma.is_finite()
            && self.greeks.theta.is_finite()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn finite(field: &str, value: f64) -> RiskCurveResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(RiskCurveError::InvalidInput {
            field: field.into(),
            reason: "must be finite".into(),
        })
    }
}

fn validate_curve_input(input: &CurveInput) -> RiskCurveResult<()> {
    if !(input.spot > 0.0) || !input.spot.is_finite() {
        return Err(RiskCurveError::InvalidInput {
            field: "spot".into(),
            reason: "Spot must be positive".into(),
        });
    }
    if !(input.spot + input.scenario.spot_offset > 0.0) {
        return Err(RiskCurveError::InvalidInput {
            field: "scenario.spot_offset".into(),
            reason: "Simulated spot must be positive".into(),
        });
    }
    if !(input.base_volatility >= 0.0) || !input.base_volatility.is_finite() {
        return Err(RiskCurveError::InvalidInput {
            field: "base_volatility".into(),
            reason: "Base volatility must be non-negative".into(),
        });
    }
    finite("scenario.time_offset_days", input.scenario.time_offset_days)?;
    finite("scenario.volatility_offset", input.scenario.volatility_offset)?;
    finite("config.risk_free_rate", input.config.risk_free_rate)?;
    if input.config.grid_points < 2 {
        return Err(RiskCurveError::InvalidInput {
            field: "config.grid_points".into(),
            reason: "Need at least 2 grid points".into(),
        });
    }
    if input.config.grid_points > MAX_GRID_POINTS {
        return Err(RiskCurveError::InvalidInput {
            field: "config.grid_points".into(),
            reason: format!("At most {MAX_GRID_POINTS} grid points"),
        });
    }
    if !(input.config.kink_epsilon > 0.0) || !input.config.kink_epsilon.is_finite() {
        return Err(RiskCurveError::InvalidInput {
            field: "config.kink_epsilon".into(),
            reason: "Kink epsilon must be positive".into(),
        });
    }
    if let Some(vol) = input.config.calendar_volatility {
        if !(vol > 0.0) || !vol.is_finite() {
            return Err(RiskCurveError::InvalidInput {
                field: "config.calendar_volatility".into(),
                reason: "Calendar volatility must be positive".into(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// A strategy with the factor that maps primary-underlying prices into its
/// own underlying (`symbol spot / primary spot`, 1 for the primary).
struct Placed {
    strategy: Strategy,
    ratio: f64,
}

impl Placed {
    fn new(strategy: Strategy, input: &CurveInput) -> Self {
        let ratio = input
            .spots
            .get(&strategy.symbol)
            .copied()
            .filter(|s| *s > 0.0 && s.is_finite())
            .map_or(1.0, |symbol_spot| symbol_spot / input.spot);
        Placed { strategy, ratio }
    }
}

struct Pass<'a> {
    ctx: PricingContext<'a>,
    valuation: NaiveDateTime,
    sim_spot: f64,
}

impl Pass<'_> {
    fn expiration(&self, strategies: &[&Placed], price: f64) -> f64 {
        strategies
            .iter()
            .map(|p| expiration_pnl(&p.strategy, price * p.ratio, &self.ctx))
            .sum()
    }

    fn theoretical(&self, strategies: &[&Placed], price: f64) -> f64 {
        strategies
            .iter()
            .map(|p| {
                theoretical_pnl(
                    &p.strategy,
                    price * p.ratio,
                    self.sim_spot * p.ratio,
                    self.valuation,
                    &self.ctx,
                )
            })
            .sum()
    }

    fn greeks(&self, strategies: &[&Placed]) -> OptionGreeks {
        let mut total = OptionGreeks::zero();
        for p in strategies {
            let own_spot = self.sim_spot * p.ratio;
            let g = strategy_greeks(&p.strategy, own_spot, own_spot, self.valuation, &self.ctx);
            // Express in primary-underlying points.
            total += OptionGreeks {
                delta: g.delta * p.ratio,
                gamma: g.gamma * p.ratio * p.ratio,
                theta: g.theta,
            };
        }
        total
    }
}

fn curve_over(grid: &[f64], f: impl Fn(f64) -> f64) -> Vec<PnlPoint> {
    grid.iter()
        .map(|&price| PnlPoint {
            price,
            pnl: f(price),
        })
        .collect()
}

/// Curve generation with errors surfaced. Prefer [`generate_curves`] in
/// interactive callers.
pub fn try_generate_curves(input: &CurveInput) -> RiskCurveResult<CurveOutput> {
    validate_curve_input(input)?;

    let sim_spot = input.spot + input.scenario.spot_offset;
    let volatility = input.base_volatility + input.scenario.volatility_offset;
    let valuation = scenario_instant(input.as_of, input.scenario.time_offset_days);

    let placed: Vec<Placed> = normalize_strategies(&input.strategies)
        .into_iter()
        .filter(|s| s.visible)
        .map(|s| Placed::new(s, input))
        .collect();
    if placed.is_empty() {
        return Ok(CurveOutput::empty(sim_spot));
    }

    let (expired, active): (Vec<&Placed>, Vec<&Placed>) = placed
        .iter()
        .partition(|p| is_expired(&p.strategy, valuation));

    let mut critical: Vec<f64> = placed
        .iter()
        .flat_map(|p| p.strategy.legs.iter().map(move |l| l.strike / p.ratio))
        .collect();
    sort_dedup(&mut critical);

    let horizon = placed
        .iter()
        .map(|p| years_to_expiry(valuation, p.strategy.primary_expiration))
        .fold(MIN_HORIZON_YEARS, f64::max);

    let (low, high) = padded_range(sim_spot, &critical, volatility, horizon);
    let grid = build_grid(
        low,
        high,
        input.config.grid_points,
        &critical,
        input.config.kink_epsilon,
    );
    tracing::debug!(
        points = grid.len(),
        active = active.len(),
        expired = expired.len(),
        low,
        high,
        "built price grid"
    );

    let pass = Pass {
        ctx: PricingContext {
            regime: input.regime.config(),
            pricing: &input.pricing,
            base_volatility: volatility,
            risk_free_rate: input.config.risk_free_rate,
            calendar_volatility: input
                .config
                .calendar_volatility
                .unwrap_or(DEFAULT_CALENDAR_VOLATILITY),
        },
        valuation,
        sim_spot,
    };

    let (expiration_curve, theoretical_curve) = if active.is_empty() {
        (Vec::new(), Vec::new())
    } else {
        (
            curve_over(&grid, |p| pass.expiration(&active, p)),
            curve_over(&grid, |p| pass.theoretical(&active, p)),
        )
    };
    let expired_expiration_curve = if expired.is_empty() {
        Vec::new()
    } else {
        curve_over(&grid, |p| pass.expiration(&expired, p))
    };
    let expired_theoretical_curve = expired_expiration_curve.clone();

    let current_theoretical_pnl =
        pass.theoretical(&active, sim_spot) + pass.expiration(&expired, sim_spot);

    let all_curves: [&[PnlPoint]; 4] = [
        &expiration_curve,
        &theoretical_curve,
        &expired_expiration_curve,
        &expired_theoretical_curve,
    ];
    let move_size = expected_move(sim_spot, volatility, horizon);
    let axis = AxisBounds {
        viewport: axis::viewport(sim_spot, &critical, move_size, low, high, &all_curves),
        full_range: axis::full_range(low, high, &all_curves),
    };

    let output = CurveOutput {
        expiration_breakevens: find_breakevens(&expiration_curve),
        theoretical_breakevens: find_breakevens(&theoretical_curve),
        greeks: pass.greeks(&active),
        active_strategy_ids: active.iter().map(|p| p.strategy.id.clone()).collect(),
        expiration_curve,
        theoretical_curve,
        expired_expiration_curve,
        expired_theoretical_curve,
        axis,
        current_theoretical_pnl,
        critical_strikes: critical,
    };

    if !output.is_finite() {
        return Err(RiskCurveError::NumericalFailure(
            "non-finite value in curve output".into(),
        ));
    }
    Ok(output)
}

/// Curves, breakevens and Greeks for the visible strategies.
///
/// Never fails: invalid input, a numerical failure or a panic anywhere in
/// the pass is logged and turned into [`CurveOutput::empty`].
pub fn generate_curves(input: &CurveInput) -> CurveOutput {
    let fallback_spot = input.spot + input.scenario.spot_offset;
    match panic::catch_unwind(AssertUnwindSafe(|| try_generate_curves(input))) {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "curve generation failed; returning empty curves");
            CurveOutput::empty(fallback_spot)
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!(panic = %message, "curve generation panicked; returning empty curves");
            CurveOutput::empty(fallback_spot)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::types::{PositionLeg, StrategyStructure};
    use crate::pricing::OptionRight;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn long_call(id: &str, symbol: &str, strike: rust_decimal::Decimal) -> StrategyInput {
        StrategyInput {
            id: id.into(),
            symbol: symbol.into(),
            visible: true,
            cost_basis: dec!(2.50),
            structure: StrategyStructure::Single {
                strike,
                expiration: date(2025, 3, 21),
                right: OptionRight::Call,
                quantity: 1,
            },
        }
    }

    fn default_input() -> CurveInput {
        CurveInput {
            strategies: vec![long_call("lc", "SPX", dec!(6000))],
            spot: 6000.0,
            spots: BTreeMap::new(),
            base_volatility: 0.16,
            as_of: date(2025, 3, 14).and_hms_opt(10, 0, 0).unwrap(),
            scenario: ScenarioOffsets::default(),
            regime: MarketRegime::Normal,
            pricing: PricingParams::default(),
            config: CurveConfig::default(),
        }
    }

    #[test]
    fn test_active_curves_populated() {
        let out = try_generate_curves(&default_input()).unwrap();
        assert_eq!(out.active_strategy_ids, vec!["lc".to_string()]);
        assert!(out.expiration_curve.len() >= 250);
        assert_eq!(out.expiration_curve.len(), out.theoretical_curve.len());
        assert!(out.expired_expiration_curve.is_empty());
        assert_eq!(out.critical_strikes, vec![6000.0]);
        assert!(out.greeks.delta > 0.0);
    }

    #[test]
    fn test_time_offset_moves_strategy_to_ghost() {
        let input = CurveInput {
            scenario: ScenarioOffsets {
                time_offset_days: 8.0,
                ..ScenarioOffsets::default()
            },
            ..default_input()
        };
        let out = try_generate_curves(&input).unwrap();
        assert!(out.active_strategy_ids.is_empty());
        assert!(out.expiration_curve.is_empty());
        assert_eq!(out.expired_expiration_curve, out.expired_theoretical_curve);
        assert!(!out.expired_expiration_curve.is_empty());
        assert_eq!(out.greeks, OptionGreeks::zero());
        // At spot the expired call is worth nothing: lose the debit.
        assert_eq!(out.current_theoretical_pnl, -250.0);
    }

    #[test]
    fn test_hidden_strategies_ignored() {
        let mut hidden = long_call("h", "SPX", dec!(5000));
        hidden.visible = false;
        let input = CurveInput {
            strategies: vec![hidden],
            ..default_input()
        };
        assert_eq!(try_generate_curves(&input).unwrap(), CurveOutput::empty(6000.0));
    }

    #[test]
    fn test_other_underlying_maps_proportionally() {
        let mut spots = BTreeMap::new();
        spots.insert("XSP".to_string(), 600.0);
        let input = CurveInput {
            strategies: vec![long_call("x", "XSP", dec!(610))],
            spots,
            ..default_input()
        };
        let out = try_generate_curves(&input).unwrap();
        assert_eq!(out.critical_strikes.len(), 1);
        assert!((out.critical_strikes[0] - 6100.0).abs() < 1e-9);
        let be = out.expiration_breakevens[0];
        // 610 + 2.50 on the small index is 6125 on the primary axis.
        assert!((be - 6125.0).abs() < 1e-6, "breakeven {be}");
    }

    #[test]
    fn test_invalid_spot_recovers_to_empty() {
        let input = CurveInput {
            spot: -5.0,
            ..default_input()
        };
        assert!(try_generate_curves(&input).is_err());
        assert_eq!(generate_curves(&input), CurveOutput::empty(-5.0));
    }

    #[test]
    fn test_bad_config_recovers_to_empty() {
        let input = CurveInput {
            config: CurveConfig {
                grid_points: 1,
                ..CurveConfig::default()
            },
            ..default_input()
        };
        let out = generate_curves(&input);
        assert!(out.expiration_curve.is_empty());
        assert_eq!(out.axis, AxisBounds::empty(6000.0));
    }

    #[test]
    fn test_oversized_grid_recovers_to_empty() {
        for grid_points in [MAX_GRID_POINTS + 1, 1 << 40] {
            let input = CurveInput {
                config: CurveConfig {
                    grid_points,
                    ..CurveConfig::default()
                },
                ..default_input()
            };
            match try_generate_curves(&input).unwrap_err() {
                RiskCurveError::InvalidInput { field, .. } => {
                    assert_eq!(field, "config.grid_points")
                }
                other => panic!("Expected InvalidInput, got {other:?}"),
            }
            assert_eq!(generate_curves(&input), CurveOutput::empty(6000.0));
        }
    }

    #[test]
    fn test_largest_grid_accepted() {
        let input = CurveInput {
            config: CurveConfig {
                grid_points: MAX_GRID_POINTS,
                ..CurveConfig::default()
            },
            ..default_input()
        };
        let out = try_generate_curves(&input).unwrap();
        assert!(out.expiration_curve.len() >= MAX_GRID_POINTS);
    }

    #[test]
    fn test_far_future_offset_expires_strategy() {
        let input = CurveInput {
            scenario: ScenarioOffsets {
                time_offset_days: 1e9,
                ..ScenarioOffsets::default()
            },
            ..default_input()
        };
        let out = try_generate_curves(&input).unwrap();
        assert!(out.active_strategy_ids.is_empty());
        assert!(out.expiration_curve.is_empty());
        assert!(!out.expired_expiration_curve.is_empty());
        assert_eq!(out.current_theoretical_pnl, -250.0);
    }

    #[test]
    fn test_far_past_offset_keeps_strategy_active() {
        let input = CurveInput {
            scenario: ScenarioOffsets {
                time_offset_days: -1e9,
                ..ScenarioOffsets::default()
            },
            ..default_input()
        };
        let out = try_generate_curves(&input).unwrap();
        assert_eq!(out.active_strategy_ids, vec!["lc".to_string()]);
        assert!(out.expired_expiration_curve.is_empty());
    }

    #[test]
    fn test_config_defaults_from_json() {
        let cfg: CurveConfig = serde_json::from_str(r#"{"grid_points": 80}"#).unwrap();
        assert_eq!(cfg.grid_points, 80);
        assert_eq!(cfg.kink_epsilon, 0.01);
        assert_eq!(cfg.risk_free_rate, 0.05);
        assert!(cfg.calendar_volatility.is_none());
    }

    #[test]
    fn test_leg_list_strategy_accepted() {
        let input = CurveInput {
            strategies: vec![StrategyInput {
                id: "strangle".into(),
                symbol: String::new(),
                visible: true,
                cost_basis: dec!(30),
                structure: StrategyStructure::Legs {
                    legs: vec![
                        PositionLeg {
                            strike: dec!(5900),
                            expiration: date(2025, 3, 21),
                            right: OptionRight::Put,
                            quantity: 1,
                        },
                        PositionLeg {
                            strike: dec!(6100),
                            expiration: date(2025, 3, 21),
                            right: OptionRight::Call,
                            quantity: 1,
                        },
                    ],
                },
            }],
            ..default_input()
        };
        let out = try_generate_curves(&input).unwrap();
        assert_eq!(out.expiration_breakevens.len(), 2);
        assert!((out.expiration_breakevens[0] - 5870.0).abs() < 1e-6);
        assert!((out.expiration_breakevens[1] - 6130.0).abs() < 1e-6);
    }
}
