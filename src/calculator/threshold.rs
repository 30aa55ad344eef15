//! Threshold / cliff finder
//!
//! A cliff is the lowest grid price at which the cut-loose rate of the tail
//! (deals priced at or above it) crosses a target rate from below. Real data
//! is not monotonic, so the scan takes the first upward crossing and does not
//! check that the rate stays high afterwards.

use crate::calculator::deal::Deal;

/// Price-sorted view with suffix cut counts for O(log n) tail queries
struct TailIndex {
    prices: Vec<f64>,
    /// `suffix_cut[i]` = cut deals among `prices[i..]`
    suffix_cut: Vec<usize>,
}

impl TailIndex {
    fn new(deals: &[Deal]) -> Self {
        let mut rows: Vec<(f64, bool)> = deals
            .iter()
            .filter(|d| d.price.is_finite())
            .map(|d| (d.price, d.outcome.is_cut()))
            .collect();
        rows.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut suffix_cut = vec![0usize; rows.len() + 1];
        for i in (0..rows.len()).rev() {
            suffix_cut[i] = suffix_cut[i + 1] + usize::from(rows[i].1);
        }

        Self {
            prices: rows.into_iter().map(|(p, _)| p).collect(),
            suffix_cut,
        }
    }

    /// (tail size, cut count) for price >= `price`
    fn tail(&self, price: f64) -> (usize, usize) {
        let idx = self.prices.partition_point(|p| *p < price);
        (self.prices.len() - idx, self.suffix_cut[idx])
    }

    fn min(&self) -> Option<f64> {
        self.prices.first().copied()
    }

    fn max(&self) -> Option<f64> {
        self.prices.last().copied()
    }
}

/// Cut-loose rate among deals priced at or above `price`
///
/// Returns `(None, 0)` when no deal is that expensive.
pub fn tail_rate_at_price(deals: &[Deal], price: f64) -> (Option<f64>, usize) {
    let (n, cut) = deals
        .iter()
        .filter(|d| d.price >= price)
        .fold((0usize, 0usize), |(n, cut), d| (n + 1, cut + usize::from(d.outcome.is_cut())));

    if n == 0 {
        (None, 0)
    } else {
        (Some(cut as f64 / n as f64), n)
    }
}

/// Lowest grid price where the tail cut rate first rises to `target_rate`
///
/// The grid runs from the minimum price rounded down to `step` through the
/// maximum rounded up, inclusive. Grid points whose tail holds fewer than
/// `tail_min_n` deals are skipped. A series that is already at or above the
/// target at its first defined point has no "before" and yields None unless it
/// later dips below and crosses again.
pub fn find_crossing(deals: &[Deal], target_rate: f64, tail_min_n: usize, step: f64) -> Option<f64> {
    if !(step.is_finite() && step > 0.0) {
        return None;
    }

    let index = TailIndex::new(deals);
    let (min, max) = (index.min()?, index.max()?);

    let start = (min / step).floor() * step;
    let end = (max / step).ceil() * step;
    let points = ((end - start) / step).round() as usize;

    let mut prev_rate: Option<f64> = None;

    for k in 0..=points {
        let price = start + k as f64 * step;
        let (n, cut) = index.tail(price);
        if n < tail_min_n || n == 0 {
            continue;
        }

        let rate = cut as f64 / n as f64;
        if let Some(prev) = prev_rate {
            if prev < target_rate && rate >= target_rate {
                return Some(price);
            }
        }
        prev_rate = Some(rate);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> Vec<Deal> {
        // 10 sold at 100k..145k, 10 cut at 200k..245k
        let mut deals: Vec<Deal> = (0..10).map(|i| Deal::sold("A", 100000.0 + i as f64 * 5000.0)).collect();
        deals.extend((0..10).map(|i| Deal::cut("A", 200000.0 + i as f64 * 5000.0)));
        deals
    }

    #[test]
    fn test_tail_rate_at_price() {
        let deals = sample();
        let (rate, n) = tail_rate_at_price(&deals, 145000.0);
        assert_eq!(n, 11);
        assert_relative_eq!(rate.unwrap(), 10.0 / 11.0);

        assert_eq!(tail_rate_at_price(&deals, 1_000_000.0), (None, 0));
    }

    #[test]
    fn test_single_crossing_found_at_grid_point() {
        let deals = sample();
        // Tail of 150000 is all cut (rate 1.0); tail of 145000 is 10/11 < 1.0
        assert_eq!(find_crossing(&deals, 0.95, 5, 5000.0), Some(150000.0));
        // 140000: 10/12 = 0.833 < 0.9, 145000: 10/11 = 0.909 >= 0.9
        assert_eq!(find_crossing(&deals, 0.90, 5, 5000.0), Some(145000.0));
    }

    #[test]
    fn test_start_above_target_is_not_a_cliff() {
        let deals: Vec<Deal> = (0..10).map(|i| Deal::cut("A", 100000.0 + i as f64 * 5000.0)).collect();
        assert_eq!(find_crossing(&deals, 0.80, 3, 5000.0), None);
    }

    #[test]
    fn test_never_crosses() {
        let deals: Vec<Deal> = (0..10).map(|i| Deal::sold("A", 100000.0 + i as f64 * 5000.0)).collect();
        assert_eq!(find_crossing(&deals, 0.80, 3, 5000.0), None);
    }

    #[test]
    fn test_sparse_tail_points_are_skipped() {
        let deals = sample();
        // A tail floor of 11 leaves 145000 (10/11) as the last defined point
        assert_eq!(find_crossing(&deals, 0.95, 11, 5000.0), None);
    }

    #[test]
    fn test_empty_and_bad_step() {
        assert_eq!(find_crossing(&[], 0.8, 1, 5000.0), None);
        assert_eq!(find_crossing(&sample(), 0.8, 1, 0.0), None);
    }
}
