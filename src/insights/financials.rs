//! Financial dashboard: gross profit and wholesale volume on sold deals

use crate::error::FeasibilityError;
use crate::utils::{f64_column_values, has_column, str_column_values, title_case};
use polars::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

const COUNTY_COL: &str = "County_clean_up";
const GROSS_PROFIT_COL: &str = "Gross_Profit";
const WHOLESALE_COL: &str = "Wholesale_Price_num";

/// Headline figures for the sold table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialTotals {
    pub total_gp: f64,
    pub total_wholesale: f64,
    pub sold_count: usize,
    /// `total_gp / sold_count`, 0 with no sold deals
    pub avg_gp_per_deal: f64,
}

/// One row of the GP-by-county table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyGpRow {
    pub county: String,
    pub sold_deals: usize,
    pub total_gp: f64,
    pub avg_gp: f64,
    /// Present on every row when any sold deal carries a wholesale price
    pub total_wholesale: Option<f64>,
    pub avg_wholesale: Option<f64>,
}

/// Optional numeric column; an absent column reads as all nulls
fn optional_f64(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>, FeasibilityError> {
    if has_column(df, column) {
        f64_column_values(df, column)
    } else {
        Ok(vec![None; df.height()])
    }
}

/// Sum and mean of the non-null values, both 0 when there are none
fn sum_and_mean(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let sum: f64 = values.iter().sum();
    (sum, sum / values.len() as f64)
}

pub fn compute_financial_totals(sold: &DataFrame) -> Result<FinancialTotals, FeasibilityError> {
    let total_gp: f64 = optional_f64(sold, GROSS_PROFIT_COL)?.into_iter().flatten().sum();
    let total_wholesale: f64 = optional_f64(sold, WHOLESALE_COL)?.into_iter().flatten().sum();
    let sold_count = sold.height();

    Ok(FinancialTotals {
        total_gp,
        total_wholesale,
        sold_count,
        avg_gp_per_deal: if sold_count > 0 { total_gp / sold_count as f64 } else { 0.0 },
    })
}

/// GP summary per county, highest total GP first
///
/// Rows with a blank county are dropped. Ties on total GP go to the county
/// with more sold deals, then by name.
pub fn build_gp_by_county(sold: &DataFrame) -> Result<Vec<CountyGpRow>, FeasibilityError> {
    if sold.height() == 0 || !has_column(sold, COUNTY_COL) {
        return Ok(Vec::new());
    }

    let counties = str_column_values(sold, COUNTY_COL)?;
    let gross = optional_f64(sold, GROSS_PROFIT_COL)?;
    let wholesale = optional_f64(sold, WHOLESALE_COL)?;
    let has_wholesale = wholesale.iter().any(Option::is_some);

    #[derive(Default)]
    struct Group {
        sold: usize,
        gp: Vec<f64>,
        wholesale: Vec<f64>,
    }

    let mut groups: FxHashMap<String, Group> = FxHashMap::default();
    for ((county, gp), ws) in counties.into_iter().zip(gross).zip(wholesale) {
        let Some(county) = county.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()) else {
            continue;
        };
        let group = groups.entry(county).or_default();
        group.sold += 1;
        group.gp.extend(gp);
        group.wholesale.extend(ws);
    }

    let mut rows: Vec<CountyGpRow> = groups
        .into_iter()
        .map(|(county, group)| {
            let (total_gp, avg_gp) = sum_and_mean(&group.gp);
            let (total_ws, avg_ws) = sum_and_mean(&group.wholesale);
            CountyGpRow {
                county: title_case(&county),
                sold_deals: group.sold,
                total_gp,
                avg_gp,
                total_wholesale: has_wholesale.then_some(total_ws),
                avg_wholesale: has_wholesale.then_some(avg_ws),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total_gp
            .total_cmp(&a.total_gp)
            .then(b.sold_deals.cmp(&a.sold_deals))
            .then_with(|| a.county.cmp(&b.county))
    });

    Ok(rows)
}
