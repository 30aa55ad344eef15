//! Twelve-month trends for counties and buyers
//!
//! Compares sold deals in the last 365 days against the 365 days before that.
//! Both windows are anchored on the latest sold date in the table so a stale
//! feed still shows a meaningful delta; the caller supplies a fallback anchor
//! for tables without any dated row.

use crate::data::{date_column_values, BUYER_COL};
use crate::error::FeasibilityError;
use crate::utils::str_column_values;
use chrono::{Duration, NaiveDate};
use polars::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

const COUNTY_COL: &str = "County_clean_up";

/// Last-12 vs prior-12 sold counts for one key (county or buyer)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendRow {
    pub key: String,
    pub last12: usize,
    pub prev12: usize,
    pub delta: i64,
}

/// Per-county sold trend, sorted by county
pub fn compute_county_trends(sold: &DataFrame, fallback_anchor: NaiveDate) -> Result<Vec<TrendRow>, FeasibilityError> {
    let mut rows = windowed_counts(sold, COUNTY_COL, fallback_anchor)?;
    rows.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(rows)
}

/// Per-buyer sold momentum, busiest buyers first
///
/// Blank buyers are ignored. Ties on `last12` break on `delta`, then name.
pub fn compute_buyer_momentum(sold: &DataFrame, fallback_anchor: NaiveDate) -> Result<Vec<TrendRow>, FeasibilityError> {
    let mut rows = windowed_counts(sold, BUYER_COL, fallback_anchor)?;
    rows.sort_by(|a, b| {
        b.last12
            .cmp(&a.last12)
            .then(b.delta.cmp(&a.delta))
            .then(a.key.cmp(&b.key))
    });
    Ok(rows)
}

/// "▲ +3", "▼ -2" or "→ 0"
pub fn format_trend(delta: i64) -> String {
    if delta > 0 {
        format!("▲ +{}", delta)
    } else if delta < 0 {
        format!("▼ {}", delta)
    } else {
        "→ 0".to_string()
    }
}

/// Dropdown label for a buyer: "Acme  ▲ +2  (5 vs 3)"
pub fn buyer_label(row: &TrendRow) -> String {
    format!("{}  {}  ({} vs {})", row.key, format_trend(row.delta), row.last12, row.prev12)
}

fn windowed_counts(
    sold: &DataFrame,
    key_col: &str,
    fallback_anchor: NaiveDate,
) -> Result<Vec<TrendRow>, FeasibilityError> {
    if sold.height() == 0 {
        return Ok(Vec::new());
    }

    let keys = str_column_values(sold, key_col)?;
    let dates = date_column_values(sold)?;

    let anchor = dates.iter().flatten().max().copied().unwrap_or(fallback_anchor);
    let last12_start = anchor - Duration::days(365);
    let prev12_start = anchor - Duration::days(730);

    let mut counts: FxHashMap<String, (usize, usize)> = FxHashMap::default();
    for (key, date) in keys.into_iter().zip(dates) {
        let (Some(key), Some(date)) = (key, date) else { continue };
        let key = key.trim().to_string();
        if key.is_empty() {
            continue;
        }

        if date > last12_start && date <= anchor {
            counts.entry(key).or_default().0 += 1;
        } else if date > prev12_start && date <= last12_start {
            counts.entry(key).or_default().1 += 1;
        }
    }

    Ok(counts
        .into_iter()
        .map(|(key, (last12, prev12))| TrendRow {
            key,
            last12,
            prev12,
            delta: last12 as i64 - prev12 as i64,
        })
        .collect())
}
