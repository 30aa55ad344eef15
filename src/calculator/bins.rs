//! Price-bin statistics
//!
//! Fixed-width bins `[low, low + size)` with a per-bin cut-loose rate. Bins
//! under the population floor are suppressed and empty bins are never emitted.

use crate::calculator::deal::Deal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One populated price bin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinStat {
    pub price_low: f64,
    pub price_high: f64,
    pub count: usize,
    pub cut_rate: f64,
}

/// Partition `deals` into `bin_size`-wide bins, ascending by `price_low`
pub fn build_bins(deals: &[Deal], bin_size: f64, min_bin_n: usize) -> Vec<BinStat> {
    if !(bin_size.is_finite() && bin_size > 0.0) {
        return Vec::new();
    }

    // Keyed by bin index so the map orders bins by price
    let mut groups: BTreeMap<i64, (usize, usize)> = BTreeMap::new();
    for deal in deals.iter().filter(|d| d.price.is_finite()) {
        let idx = (deal.price / bin_size).floor() as i64;
        let entry = groups.entry(idx).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += usize::from(deal.outcome.is_cut());
    }

    groups
        .into_iter()
        .filter(|(_, (count, _))| *count >= min_bin_n)
        .map(|(idx, (count, cut))| {
            let price_low = idx as f64 * bin_size;
            BinStat {
                price_low,
                price_high: price_low + bin_size,
                count,
                cut_rate: cut as f64 / count as f64,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bins_assignment_and_rates() {
        let deals = vec![
            Deal::sold("A", 100000.0),
            Deal::sold("A", 104999.0),
            Deal::cut("A", 103000.0),
            Deal::cut("A", 105000.0),
            Deal::cut("A", 109000.0),
        ];

        let bins = build_bins(&deals, 5000.0, 1);
        assert_eq!(bins.len(), 2);
        assert_relative_eq!(bins[0].price_low, 100000.0);
        assert_relative_eq!(bins[0].price_high, 105000.0);
        assert_eq!(bins[0].count, 3);
        assert_relative_eq!(bins[0].cut_rate, 1.0 / 3.0);
        assert_eq!(bins[1].count, 2);
        assert_relative_eq!(bins[1].cut_rate, 1.0);
    }

    #[test]
    fn test_small_bins_suppressed_and_gaps_not_filled() {
        let deals = vec![
            Deal::sold("A", 100000.0),
            Deal::sold("A", 101000.0),
            Deal::sold("A", 150000.0),
            Deal::sold("A", 200000.0),
            Deal::cut("A", 201000.0),
        ];

        let bins = build_bins(&deals, 5000.0, 2);
        let lows: Vec<f64> = bins.iter().map(|b| b.price_low).collect();
        assert_eq!(lows, vec![100000.0, 200000.0]);
        assert!(bins.iter().all(|b| b.count >= 2));
    }

    #[test]
    fn test_empty_input() {
        assert!(build_bins(&[], 5000.0, 1).is_empty());
    }
}
