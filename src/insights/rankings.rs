//! County rankings table

use crate::insights::counts::CountyCounts;
use crate::utils::title_case;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRow {
    pub county: String,
    pub sold: usize,
    pub cut: usize,
    pub total: usize,
    pub buyer_count: usize,
    /// Health score rounded to 3 decimals
    pub health_score: f64,
    /// Close rate in percent, 1 decimal
    pub close_rate: f64,
}

/// One row per county with any deal, sorted by county name
pub fn build_rankings(
    counts: &CountyCounts,
    buyer_count_by_county: &FxHashMap<String, usize>,
    health_by_county: &FxHashMap<String, f64>,
) -> Vec<RankingRow> {
    counts
        .counties()
        .into_iter()
        .map(|county| {
            let sold = counts.sold_in(&county);
            let cut = counts.cut_in(&county);
            let total = sold + cut;
            let close_rate = if total > 0 { sold as f64 / total as f64 } else { 0.0 };
            let health = health_by_county.get(&county).copied().unwrap_or(0.0);

            RankingRow {
                county: title_case(&county),
                sold,
                cut,
                total,
                buyer_count: buyer_count_by_county.get(&county).copied().unwrap_or(0),
                health_score: (health * 1000.0).round() / 1000.0,
                close_rate: (close_rate * 1000.0).round() / 10.0,
            }
        })
        .collect()
}
