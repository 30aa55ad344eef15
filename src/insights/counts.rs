//! Per-county sold / cut-loose tallies

use crate::data::{BUYER_COL, STATUS_COL};
use crate::error::FeasibilityError;
use crate::utils::{has_column, str_column_values, StatusNorm};
use polars::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

const COUNTY_COL: &str = "County_clean_up";
const DISPO_REP_COL: &str = "Dispo_Rep_clean";

/// County → sold count and county → cut-loose count
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountyCounts {
    pub sold: FxHashMap<String, usize>,
    pub cut: FxHashMap<String, usize>,
}

impl CountyCounts {
    pub fn sold_in(&self, county: &str) -> usize {
        self.sold.get(county).copied().unwrap_or(0)
    }

    pub fn cut_in(&self, county: &str) -> usize {
        self.cut.get(county).copied().unwrap_or(0)
    }

    /// Every county with at least one sold or cut-loose deal
    pub fn counties(&self) -> Vec<String> {
        let mut all: Vec<String> = self.sold.keys().chain(self.cut.keys()).cloned().collect();
        all.sort();
        all.dedup();
        all
    }
}

/// Count sold and cut-loose deals per county
///
/// With `dispo_rep` set, sold rows are narrowed to that rep; cut-loose rows
/// are never filtered by rep.
pub fn county_sold_cut_counts(
    sold: &DataFrame,
    cut: &DataFrame,
    dispo_rep: Option<&str>,
) -> Result<CountyCounts, FeasibilityError> {
    let mut counts = CountyCounts::default();

    for df in [sold, cut] {
        if df.height() == 0 {
            continue;
        }

        let counties = str_column_values(df, COUNTY_COL)?;
        let status = str_column_values(df, STATUS_COL)?;
        let reps = if dispo_rep.is_some() && has_column(df, DISPO_REP_COL) {
            Some(str_column_values(df, DISPO_REP_COL)?)
        } else {
            None
        };

        for (idx, (county, status)) in counties.iter().zip(&status).enumerate() {
            let Some(county) = county else { continue };
            match status.as_deref().map(StatusNorm::from_label) {
                Some(StatusNorm::Sold) => {
                    if let (Some(want), Some(reps)) = (dispo_rep, &reps) {
                        if reps[idx].as_deref() != Some(want) {
                            continue;
                        }
                    }
                    *counts.sold.entry(county.clone()).or_insert(0) += 1;
                }
                Some(StatusNorm::CutLoose) => {
                    *counts.cut.entry(county.clone()).or_insert(0) += 1;
                }
                _ => {}
            }
        }
    }

    Ok(counts)
}

/// Distinct non-blank buyers per county (sold deals only)
pub fn buyer_count_by_county(sold: &DataFrame) -> Result<FxHashMap<String, usize>, FeasibilityError> {
    if sold.height() == 0 {
        return Ok(FxHashMap::default());
    }

    let counties = str_column_values(sold, COUNTY_COL)?;
    let buyers = str_column_values(sold, BUYER_COL)?;

    let mut seen: FxHashMap<String, FxHashSet<String>> = FxHashMap::default();
    for (county, buyer) in counties.into_iter().zip(buyers) {
        if let (Some(county), Some(buyer)) = (county, buyer) {
            let buyer = buyer.trim();
            if !buyer.is_empty() {
                seen.entry(county).or_default().insert(buyer.to_string());
            }
        }
    }

    Ok(seen.into_iter().map(|(county, set)| (county, set.len())).collect())
}

/// Headline totals for the current window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallStats {
    pub sold_total: usize,
    pub cut_total: usize,
    pub total_deals: usize,
    pub total_buyers: usize,
    /// "62.5%" or "N/A" when there are no deals
    pub close_rate_str: String,
}

pub fn compute_overall_stats(sold: &DataFrame, cut: &DataFrame) -> Result<OverallStats, FeasibilityError> {
    let sold_total = sold.height();
    let cut_total = cut.height();
    let total_deals = sold_total + cut_total;

    let total_buyers = if sold_total == 0 {
        0
    } else {
        str_column_values(sold, BUYER_COL)?
            .into_iter()
            .flatten()
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .collect::<FxHashSet<_>>()
            .len()
    };

    let close_rate_str = if total_deals > 0 {
        format!("{:.1}%", sold_total as f64 / total_deals as f64 * 100.0)
    } else {
        "N/A".to_string()
    };

    Ok(OverallStats {
        sold_total,
        cut_total,
        total_deals,
        total_buyers,
        close_rate_str,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sold() -> DataFrame {
        df![
            "County_clean_up" => &["DAVIDSON", "DAVIDSON", "SHELBY"],
            "Status_norm" => &["sold", "sold", "sold"],
            "Buyer_clean" => &["Acme", "", "Acme"],
            "Dispo_Rep_clean" => &["Kim", "Lee", "Kim"],
        ]
        .unwrap()
    }

    fn cut() -> DataFrame {
        df![
            "County_clean_up" => &["DAVIDSON", "KNOX"],
            "Status_norm" => &["cut loose", "cut loose"],
            "Buyer_clean" => &["", ""],
            "Dispo_Rep_clean" => &["Lee", "Lee"],
        ]
        .unwrap()
    }

    #[test]
    fn test_county_counts() {
        let counts = county_sold_cut_counts(&sold(), &cut(), None).unwrap();
        assert_eq!(counts.sold_in("DAVIDSON"), 2);
        assert_eq!(counts.cut_in("DAVIDSON"), 1);
        assert_eq!(counts.cut_in("SHELBY"), 0);
        assert_eq!(counts.counties(), vec!["DAVIDSON", "KNOX", "SHELBY"]);
    }

    #[test]
    fn test_dispo_rep_narrows_sold_only() {
        let counts = county_sold_cut_counts(&sold(), &cut(), Some("Kim")).unwrap();
        assert_eq!(counts.sold_in("DAVIDSON"), 1);
        assert_eq!(counts.cut_in("DAVIDSON"), 1);
        assert_eq!(counts.cut_in("KNOX"), 1);
    }

    #[test]
    fn test_buyer_count_skips_blank() {
        let buyers = buyer_count_by_county(&sold()).unwrap();
        assert_eq!(buyers.get("DAVIDSON"), Some(&1));
        assert_eq!(buyers.get("SHELBY"), Some(&1));
    }

    #[test]
    fn test_overall_stats() {
        let stats = compute_overall_stats(&sold(), &cut()).unwrap();
        assert_eq!(stats.total_deals, 5);
        assert_eq!(stats.total_buyers, 1);
        assert_eq!(stats.close_rate_str, "60.0%");

        let empty = compute_overall_stats(&DataFrame::empty(), &DataFrame::empty()).unwrap();
        assert_eq!(empty.close_rate_str, "N/A");
    }
}
