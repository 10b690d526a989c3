use crate::types::Years;

/// Padding floor: the larger of this fraction of spot and
/// [`MIN_PADDING_POINTS`].
pub const MIN_PADDING_FRACTION: f64 = 0.10;
pub const MIN_PADDING_POINTS: f64 = 200.0;
/// The grid never starts below this fraction of spot.
pub const LOWER_BOUND_FRACTION: f64 = 0.01;
/// Largest even-spaced grid a caller may ask for.
pub const MAX_GRID_POINTS: usize = 10_000;
/// Shortest horizon used for the expected move.
pub const MIN_HORIZON_YEARS: Years = 1.0 / 365.0;

/// Sort ascending and drop exact and near-exact duplicates.
pub fn sort_dedup(values: &mut Vec<f64>) {
    values.retain(|v| v.is_finite());
    values.sort_by(f64::total_cmp);
    values.dedup_by(|a, b| (*a - *b).abs() <= 1e-9 * b.abs().max(1.0));
}

/// Lowest and highest strike, if any.
pub fn strike_hull(strikes: &[f64]) -> Option<(f64, f64)> {
    strikes.iter().fold(None, |acc, &k| match acc {
        None => Some((k, k)),
        Some((lo, hi)) => Some((f64::min(lo, k), f64::max(hi, k))),
    })
}

/// One-sigma move of `spot` over `horizon` years.
pub fn expected_move(spot: f64, volatility: f64, horizon: Years) -> f64 {
    spot * volatility.max(0.0) * horizon.max(MIN_HORIZON_YEARS).sqrt()
}

/// Price window for the grid: strikes and spot, padded on both sides by
/// the largest of twice the expected move, twice the strike range, and the
/// fixed floor.
pub fn padded_range(spot: f64, strikes: &[f64], volatility: f64, horizon: Years) -> (f64, f64) {
    let hull = strike_hull(strikes);
    let strike_range = hull.map_or(0.0, |(a, b)| b - a);
    let (lo, hi) = hull.map_or((spot, spot), |(a, b)| (a.min(spot), b.max(spot)));

    let padding = (2.0 * expected_move(spot, volatility, horizon))
        .max(2.0 * strike_range)
        .max((MIN_PADDING_FRACTION * spot).max(MIN_PADDING_POINTS));

    let low = (lo - padding).max(LOWER_BOUND_FRACTION * spot);
    (low, hi + padding)
}

/// `points` evenly spaced prices across `[low, high]`, plus `K - eps`, `K`
/// and `K + eps` for every critical strike inside the range.
pub fn build_grid(low: f64, high: f64, points: usize, critical: &[f64], epsilon: f64) -> Vec<f64> {
    let mut grid = Vec::with_capacity(points + 3 * critical.len());
    let steps = points.saturating_sub(1).max(1) as f64;
    let width = high - low;
    for i in 0..points {
        grid.push(low + width * i as f64 / steps);
    }

    for &k in critical {
        if k < low || k > high {
            continue;
        }
        for p in [k - epsilon, k, k + epsilon] {
            if p >= low && p <= high {
                grid.push(p);
            }
        }
    }

    sort_dedup(&mut grid);
    grid
}
