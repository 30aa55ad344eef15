//! Row-level deal records consumed by the calculator
//!
//! The calculator never works on DataFrames directly: tables are extracted once
//! into `Vec<Deal>` (dropping rows without a usable price) and every component
//! below runs plain iteration over slices.

use crate::error::FeasibilityError;
use crate::utils::{f64_column_values, has_column, normalize_county, require_columns, str_column_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Column holding the normalized county name
pub const COUNTY_COL: &str = "County_clean_up";

/// Raw county column, normalized on the fly when the clean one is absent
pub const RAW_COUNTY_COL: &str = "County";

/// Amended price if present, else contract price
pub const EFFECTIVE_PRICE_COL: &str = "Effective_Contract_Price";

/// Deal outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Sold,
    CutLoose,
}

impl Outcome {
    pub fn is_cut(&self) -> bool {
        matches!(self, Outcome::CutLoose)
    }

    pub fn is_sold(&self) -> bool {
        matches!(self, Outcome::Sold)
    }
}

/// One closed or failed deal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    /// Normalized county (upper-case, trimmed, no " COUNTY" suffix)
    pub county: String,
    /// Effective settlement price
    pub price: f64,
    pub outcome: Outcome,
}

impl Deal {
    pub fn new(county: &str, price: f64, outcome: Outcome) -> Self {
        Self {
            county: county.trim().to_uppercase(),
            price,
            outcome,
        }
    }

    pub fn sold(county: &str, price: f64) -> Self {
        Self::new(county, price, Outcome::Sold)
    }

    pub fn cut(county: &str, price: f64) -> Self {
        Self::new(county, price, Outcome::CutLoose)
    }
}

/// Outcome tallies for a deal slice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealCounts {
    pub n: usize,
    pub sold: usize,
    pub cut: usize,
}

impl DealCounts {
    pub fn of(deals: &[Deal]) -> Self {
        let cut = deals.iter().filter(|d| d.outcome.is_cut()).count();
        Self {
            n: deals.len(),
            sold: deals.len() - cut,
            cut,
        }
    }
}

/// Extract deals from a single-outcome table
///
/// The caller pre-splits sold and cut-loose rows, so `outcome` labels every row.
/// Rows with a missing or unparsable price are dropped silently; a missing
/// price column is a configuration error. An empty table without columns is
/// treated as "no deals" rather than as a schema problem.
///
/// # Arguments
/// * `df` - Sold-only or cut-only table
/// * `outcome` - Outcome applied to every row
/// * `context` - Label for error messages ("sold deals", "cut-loose deals")
pub fn extract_deals(
    df: &DataFrame,
    outcome: Outcome,
    context: &str,
) -> Result<Vec<Deal>, FeasibilityError> {
    if df.height() == 0 && df.width() == 0 {
        return Ok(Vec::new());
    }

    require_columns(df, &[EFFECTIVE_PRICE_COL], context)?;

    let counties: Vec<Option<String>> = if has_column(df, COUNTY_COL) {
        str_column_values(df, COUNTY_COL)?
            .into_iter()
            .map(|opt| opt.map(|s| s.trim().to_uppercase()))
            .collect()
    } else if has_column(df, RAW_COUNTY_COL) {
        str_column_values(df, RAW_COUNTY_COL)?
            .into_iter()
            .map(|opt| opt.map(|s| normalize_county(&s)))
            .collect()
    } else {
        return Err(FeasibilityError::missing_column(COUNTY_COL, context));
    };

    let prices = f64_column_values(df, EFFECTIVE_PRICE_COL)?;

    let deals: Vec<Deal> = counties
        .into_iter()
        .zip(prices)
        .filter_map(|(county, price)| {
            Some(Deal {
                county: county.unwrap_or_default(),
                price: price?,
                outcome,
            })
        })
        .collect();

    tracing::debug!(
        context,
        rows = df.height(),
        kept = deals.len(),
        "extracted deals"
    );

    Ok(deals)
}

/// Mean price of sold deals, None when there are none
pub fn avg_sold_price(deals: &[Deal]) -> Option<f64> {
    let (sum, n) = deals
        .iter()
        .filter(|d| d.outcome.is_sold())
        .fold((0.0, 0usize), |(sum, n), d| (sum + d.price, n + 1));

    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}

/// Highest sold price, None when there are no sold deals
pub fn max_sold_price(deals: &[Deal]) -> Option<f64> {
    deals
        .iter()
        .filter(|d| d.outcome.is_sold())
        .map(|d| d.price)
        .fold(None, |acc: Option<f64>, p| Some(acc.map_or(p, |m| m.max(p))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_extract_drops_unparsable_prices() {
        let df = df![
            "County_clean_up" => &["davidson ", "DAVIDSON", "SHELBY"],
            "Effective_Contract_Price" => &["$100,000", "", "oops"],
        ]
        .unwrap();

        let deals = extract_deals(&df, Outcome::Sold, "sold deals").unwrap();
        assert_eq!(deals.len(), 1);
        assert_eq!(deals[0].county, "DAVIDSON");
        assert_relative_eq!(deals[0].price, 100000.0);
    }

    #[test]
    fn test_extract_missing_price_column_is_configuration_error() {
        let df = df![
            "County_clean_up" => &["DAVIDSON"],
        ]
        .unwrap();

        let err = extract_deals(&df, Outcome::Sold, "sold deals").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_extract_falls_back_to_raw_county() {
        let df = df![
            "County" => &["Davidson County"],
            "Effective_Contract_Price" => &[120000.0],
        ]
        .unwrap();

        let deals = extract_deals(&df, Outcome::CutLoose, "cut-loose deals").unwrap();
        assert_eq!(deals[0].county, "DAVIDSON");
        assert!(deals[0].outcome.is_cut());
    }

    #[test]
    fn test_extract_empty_frame() {
        let deals = extract_deals(&DataFrame::empty(), Outcome::CutLoose, "cut-loose deals").unwrap();
        assert!(deals.is_empty());
    }

    #[test]
    fn test_sold_aggregates() {
        let deals = vec![
            Deal::sold("A", 100000.0),
            Deal::sold("A", 140000.0),
            Deal::cut("A", 500000.0),
        ];
        assert_relative_eq!(avg_sold_price(&deals).unwrap(), 120000.0);
        assert_relative_eq!(max_sold_price(&deals).unwrap(), 140000.0);
        assert_eq!(DealCounts::of(&deals), DealCounts { n: 3, sold: 2, cut: 1 });
    }

    #[test]
    fn test_sold_aggregates_without_sold_deals() {
        let deals = vec![Deal::cut("A", 500000.0)];
        assert_eq!(avg_sold_price(&deals), None);
        assert_eq!(max_sold_price(&deals), None);
    }
}
