use crate::types::PnlPoint;

/// Crossings closer than this (relative to price) are reported once.
const DUPLICATE_TOLERANCE: f64 = 1e-6;

/// Every price at which the curve crosses zero, ascending.
///
/// A crossing is a step from negative to non-negative or from positive to
/// non-positive; the zero is placed by linear interpolation between the two
/// points. A curve that only touches zero from one side reports the touch.
pub fn find_breakevens(curve: &[PnlPoint]) -> Vec<f64> {
    let mut breakevens: Vec<f64> = Vec::new();

    for pair in curve.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        let crosses = (prev.pnl < 0.0 && curr.pnl >= 0.0) || (prev.pnl > 0.0 && curr.pnl <= 0.0);
        if !crosses {
            continue;
        }

        let fraction = prev.pnl.abs() / (curr.pnl - prev.pnl).abs();
        let be = prev.price + fraction * (curr.price - prev.price);
        if !be.is_finite() {
            continue;
        }

        let duplicate = breakevens
            .last()
            .is_some_and(|&last| (be - last).abs() <= DUPLICATE_TOLERANCE * be.abs().max(1.0));
        if !duplicate {
            breakevens.push(be);
        }
    }

    breakevens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(points: &[(f64, f64)]) -> Vec<PnlPoint> {
        points
            .iter()
            .map(|&(price, pnl)| PnlPoint { price, pnl })
            .collect()
    }

    #[test]
    fn test_long_call_breakeven() {
        let c = curve(&[(5950.0, -250.0), (6000.0, -250.0), (6050.0, 4750.0)]);
        let be = find_breakevens(&c);
        assert_eq!(be.len(), 1);
        assert!((be[0] - 6002.5).abs() < 1e-9);
    }

    #[test]
    fn test_butterfly_has_two_breakevens() {
        let c = curve(&[
            (5900.0, -500.0),
            (5950.0, -500.0),
            (6000.0, 4500.0),
            (6050.0, -500.0),
            (6100.0, -500.0),
        ]);
        let be = find_breakevens(&c);
        assert_eq!(be.len(), 2);
        assert!((be[0] - 5955.0).abs() < 1e-9);
        assert!((be[1] - 6045.0).abs() < 1e-9);
    }

    #[test]
    fn test_exact_zero_point_counted_once() {
        let c = curve(&[(90.0, -10.0), (100.0, 0.0), (110.0, 10.0)]);
        assert_eq!(find_breakevens(&c), vec![100.0]);
    }

    #[test]
    fn test_touch_from_above() {
        let c = curve(&[(90.0, 10.0), (100.0, 0.0), (110.0, 10.0)]);
        assert_eq!(find_breakevens(&c), vec![100.0]);
    }

    #[test]
    fn test_no_crossing() {
        let c = curve(&[(90.0, 5.0), (100.0, 1.0), (110.0, 7.0)]);
        assert!(find_breakevens(&c).is_empty());
        assert!(find_breakevens(&[]).is_empty());
    }

    #[test]
    fn test_near_duplicates_collapse() {
        // Numerical chatter around zero on a flat stretch.
        let c = curve(&[
            (99.0, -5.0),
            (100.0, 1e-12),
            (100.000_000_01, -1e-12),
            (100.000_000_02, 1e-12),
            (101.0, 5.0),
        ]);
        let be = find_breakevens(&c);
        assert_eq!(be.len(), 1);
        assert!((be[0] - 100.0).abs() < 1e-6);
    }
}
