use serde::{Deserialize, Serialize};

use crate::curve::grid::strike_hull;
use crate::types::PnlPoint;

/// Fraction of the P&L span added above and below.
const PNL_PADDING: f64 = 0.10;
/// P&L half-height used when there is nothing to show.
const EMPTY_PNL_HALF_RANGE: f64 = 100.0;
/// Viewport margin floor as a fraction of spot.
const MIN_VIEW_MARGIN_FRACTION: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub price_min: f64,
    pub price_max: f64,
    pub pnl_min: f64,
    pub pnl_max: f64,
}

/// What the chart opens on, and the extent it can zoom out to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisBounds {
    pub viewport: AxisRange,
    pub full_range: AxisRange,
}

impl AxisBounds {
    /// Axes for an empty chart: spot +/- 10% (or the unit window when spot
    /// is unusable) and +/- 100 of P&L.
    pub fn empty(spot: f64) -> Self {
        let (price_min, price_max) = if spot > 0.0 && spot.is_finite() {
            (spot * 0.9, spot * 1.1)
        } else {
            (0.0, 1.0)
        };
        let range = AxisRange {
            price_min,
            price_max,
            pnl_min: -EMPTY_PNL_HALF_RANGE,
            pnl_max: EMPTY_PNL_HALF_RANGE,
        };
        AxisBounds {
            viewport: range,
            full_range: range,
        }
    }
}

/// Padded P&L bounds that always include zero.
fn pnl_bounds<'a>(points: impl Iterator<Item = &'a PnlPoint>) -> (f64, f64) {
    let (lo, hi) = points.fold((0.0_f64, 0.0_f64), |(lo, hi), p| {
        (lo.min(p.pnl), hi.max(p.pnl))
    });
    let span = hi - lo;
    if span > 0.0 {
        (lo - PNL_PADDING * span, hi + PNL_PADDING * span)
    } else {
        (-EMPTY_PNL_HALF_RANGE, EMPTY_PNL_HALF_RANGE)
    }
}

/// Everything: grid ends and the P&L extremes of every curve.
pub fn full_range(grid_low: f64, grid_high: f64, curves: &[&[PnlPoint]]) -> AxisRange {
    let (pnl_min, pnl_max) = pnl_bounds(curves.iter().flat_map(|c| c.iter()));
    AxisRange {
        price_min: grid_low,
        price_max: grid_high,
        pnl_min,
        pnl_max,
    }
}

/// The interesting region: the hull of strikes and spot, widened by the
/// largest of the expected move, half the strike range and 5% of spot,
/// clipped to the grid. P&L bounds come from the points inside it.
pub fn viewport(
    spot: f64,
    strikes: &[f64],
    expected_move: f64,
    grid_low: f64,
    grid_high: f64,
    curves: &[&[PnlPoint]],
) -> AxisRange {
    let hull = strike_hull(strikes);
    let strike_range = hull.map_or(0.0, |(a, b)| b - a);
    let (lo, hi) = hull.map_or((spot, spot), |(a, b)| (a.min(spot), b.max(spot)));
    let margin = expected_move
        .max(0.5 * strike_range)
        .max(MIN_VIEW_MARGIN_FRACTION * spot);

    let price_min = (lo - margin).max(grid_low);
    let price_max = (hi + margin).min(grid_high);

    let inside = curves
        .iter()
        .flat_map(|c| c.iter())
        .filter(|p| p.price >= price_min && p.price <= price_max);
    let (pnl_min, pnl_max) = pnl_bounds(inside);

    AxisRange {
        price_min,
        price_max,
        pnl_min,
        pnl_max,
    }
}
