//! Data Loading and Normalization
//!
//! Loads the deals feed, the MAO tiers sheet and the county adjacency file,
//! and hardens the feed into the normalized column set every other module
//! reads (`County_clean_up`, `Status_norm`, `Effective_Contract_Price`, ...).

use crate::calculator::CountyAdjacency;
use crate::error::FeasibilityError;
use crate::utils::{
    f64_column_values, has_column, normalize_county, normalize_county_key, normalize_status,
    require_columns, str_column_values, StatusNorm,
};
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::path::Path;

/// Columns the raw feed must carry
pub const REQUIRED_COLS: &[&str] = &["County", "Status", "Contract Price"];

/// Raw columns synthesized as empty strings when the sheet omits them
const OPTIONAL_COLS: &[&str] = &[
    "Salesforce_URL",
    "Buyer",
    "Date",
    "Status",
    "County",
    "Address",
    "City",
    "Dispo Rep",
    "Contract Price",
    "Amended Price",
    "Wholesale Price",
    "Market",
    "Acquisition Rep",
];

const DISPO_REP_HEADERS: &[&str] = &["Dispo Rep", "Dispo_Rep", "DispoRep", "DISPO REP"];

/// ISO date column produced by `normalize_inputs`
pub const DATE_COL: &str = "Date_dt";

/// Normalized status column ("sold" / "cut loose" / "")
pub const STATUS_COL: &str = "Status_norm";

/// Trimmed buyer name column
pub const BUYER_COL: &str = "Buyer_clean";

/// Normalized deals feed plus its lookup tables
pub struct DealData {
    /// Normalized feed (one row per deal, every status)
    pub deals: DataFrame,

    /// Normalized MAO tiers (`County_clean_up`, `County_key`, `MAO_Tier`, `MAO_Range_Str`)
    pub tiers: DataFrame,

    /// County → bordering counties
    pub adjacency: CountyAdjacency,
}

impl DealData {
    /// Load the feed, the optional tiers sheet and the optional adjacency file
    ///
    /// A tiers sheet that fails to load or normalize is logged and replaced by
    /// blank tiers; the feed and adjacency files are hard requirements once
    /// given.
    pub fn load(feed_csv: &Path, tiers_csv: Option<&Path>, adjacency_json: Option<&Path>) -> Result<Self> {
        tracing::info!(path = ?feed_csv, "loading deals feed");
        let raw = Self::read_csv(feed_csv)?;

        let tiers = match tiers_csv {
            Some(path) => match Self::read_csv(path) {
                Ok(df) => Some(df),
                Err(e) => {
                    tracing::warn!(error = %e, "could not load MAO tiers, showing blank tiers");
                    None
                }
            },
            None => None,
        };

        let adjacency = match adjacency_json {
            Some(path) => CountyAdjacency::load_json(path)?,
            None => CountyAdjacency::empty(),
        };

        Self::from_frames(raw, tiers, adjacency)
    }

    /// Build from in-memory frames (raw feed, raw tiers sheet)
    pub fn from_frames(raw: DataFrame, tiers: Option<DataFrame>, adjacency: CountyAdjacency) -> Result<Self> {
        require_columns(&raw, REQUIRED_COLS, "deals feed")
            .with_context(|| "Missing required columns in sheet")?;

        let mut deals = normalize_inputs(&raw).with_context(|| "Failed to normalize deals feed")?;

        let tiers = match tiers.map(|t| normalize_tiers(&t)) {
            Some(Ok(t)) => t,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "could not normalize MAO tiers, showing blank tiers");
                empty_tiers()?
            }
            None => empty_tiers()?,
        };

        merge_tiers(&mut deals, &tiers)?;

        tracing::info!(
            deals = deals.height(),
            tiers = tiers.height(),
            counties = adjacency.len(),
            "deal data ready"
        );

        Ok(Self { deals, tiers, adjacency })
    }

    fn read_csv(path: &Path) -> Result<DataFrame> {
        CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.into()))
            .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
            .finish()
            .with_context(|| format!("Failed to load CSV: {:?}", path))
    }

    /// Distinct non-empty counties in the feed, sorted
    pub fn counties(&self) -> Result<Vec<String>, FeasibilityError> {
        let values = str_column_values(&self.deals, "County_clean_up")?;
        let set: BTreeSet<String> = values.into_iter().flatten().filter(|c| !c.is_empty()).collect();
        Ok(set.into_iter().collect())
    }

    /// Counties offered for selection
    ///
    /// The tiers sheet lists every county, so it wins when loaded; otherwise
    /// the feed's own counties are used.
    pub fn county_options(&self) -> Result<Vec<String>, FeasibilityError> {
        if self.tiers.height() == 0 {
            return self.counties();
        }
        let values = str_column_values(&self.tiers, "County_clean_up")?;
        let set: BTreeSet<String> = values.into_iter().flatten().filter(|c| !c.is_empty()).collect();
        Ok(set.into_iter().collect())
    }

    /// County → (MAO tier, range string) for counties with a tier row
    pub fn tier_lookup(&self) -> Result<FxHashMap<String, (String, String)>, FeasibilityError> {
        let counties = str_column_values(&self.tiers, "County_clean_up")?;
        let tiers = str_column_values(&self.tiers, "MAO_Tier")?;
        let ranges = str_column_values(&self.tiers, "MAO_Range_Str")?;

        let mut lookup = FxHashMap::default();
        for ((county, tier), range) in counties.into_iter().zip(tiers).zip(ranges) {
            if let Some(county) = county.filter(|c| !c.is_empty()) {
                lookup
                    .entry(county)
                    .or_insert((tier.unwrap_or_default(), range.unwrap_or_default()));
            }
        }
        Ok(lookup)
    }
}

/// Harden the raw deals sheet into the normalized column set
///
/// Never removes columns. Adds `County_clean_up`, `County_key`, `Buyer_clean`,
/// `Status_norm`, `Date_dt`, `Year`, `Dispo_Rep_clean`, `Market_clean`,
/// `Acquisition_Rep_clean`, the `*_num` money columns,
/// `Effective_Contract_Price` and `Gross_Profit`.
pub fn normalize_inputs(raw: &DataFrame) -> Result<DataFrame, FeasibilityError> {
    let mut df = raw.clone();
    let height = df.height();

    for &col in OPTIONAL_COLS {
        if !has_column(&df, col) {
            df.with_column(Series::new(col.into(), vec![""; height]))?;
        }
    }

    // ============================================================================
    // Text columns
    // ============================================================================

    let county_clean: Vec<String> = str_column_values(&df, "County")?
        .into_iter()
        .map(|opt| opt.map(|s| normalize_county(&s)).unwrap_or_default())
        .collect();
    let county_key: Vec<String> = county_clean.iter().map(|c| normalize_county_key(c)).collect();

    let status: Vec<&str> = str_column_values(&df, "Status")?
        .into_iter()
        .map(|opt| opt.map_or(StatusNorm::Unknown, |s| normalize_status(&s)).as_str())
        .collect();

    let buyer = trimmed_values(&df, "Buyer")?;

    let dispo_col = DISPO_REP_HEADERS
        .iter()
        .copied()
        .find(|c| has_column(&df, c))
        .unwrap_or("Dispo Rep");
    let dispo = trimmed_values(&df, dispo_col)?;
    let market = trimmed_values(&df, "Market")?;
    let acq_rep = trimmed_values(&df, "Acquisition Rep")?;

    // ============================================================================
    // Dates
    // ============================================================================

    let dates: Vec<Option<NaiveDate>> = str_column_values(&df, "Date")?
        .into_iter()
        .map(|opt| opt.and_then(|s| parse_date(&s)))
        .collect();
    let date_iso: Vec<Option<String>> = dates
        .iter()
        .map(|d| d.map(|d| d.format("%Y-%m-%d").to_string()))
        .collect();
    let year: Vec<Option<i32>> = dates.iter().map(|d| d.map(|d| d.year())).collect();

    // ============================================================================
    // Financials
    // ============================================================================

    let contract = f64_column_values(&df, "Contract Price")?;
    let amended = f64_column_values(&df, "Amended Price")?;
    let wholesale = f64_column_values(&df, "Wholesale Price")?;

    let effective: Vec<Option<f64>> = contract
        .iter()
        .zip(&amended)
        .map(|(c, a)| a.or(*c))
        .collect();
    let gross: Vec<Option<f64>> = wholesale
        .iter()
        .zip(&effective)
        .map(|(w, e)| match (w, e) {
            (Some(w), Some(e)) => Some(w - e),
            _ => None,
        })
        .collect();

    df.with_column(Series::new("County_clean_up".into(), county_clean))?;
    df.with_column(Series::new("County_key".into(), county_key))?;
    df.with_column(Series::new(BUYER_COL.into(), buyer))?;
    df.with_column(Series::new(STATUS_COL.into(), status))?;
    df.with_column(Series::new(DATE_COL.into(), date_iso))?;
    df.with_column(Series::new("Year".into(), year))?;
    df.with_column(Series::new("Dispo_Rep_clean".into(), dispo))?;
    df.with_column(Series::new("Market_clean".into(), market))?;
    df.with_column(Series::new("Acquisition_Rep_clean".into(), acq_rep))?;
    df.with_column(Series::new("Contract_Price_num".into(), contract))?;
    df.with_column(Series::new("Amended_Price_num".into(), amended))?;
    df.with_column(Series::new("Wholesale_Price_num".into(), wholesale))?;
    df.with_column(Series::new("Effective_Contract_Price".into(), effective))?;
    df.with_column(Series::new("Gross_Profit".into(), gross))?;

    tracing::debug!(rows = height, "normalized deals feed");
    Ok(df)
}

/// Normalize the MAO tiers sheet to `County_clean_up`, `County_key`, `MAO_Tier`, `MAO_Range_Str`
///
/// Header names are matched case-insensitively. Without a county header the
/// first column is used. A single range column wins over min/max columns;
/// min/max fractions at or below 1.0 are read as proportions and scaled to
/// percent.
pub fn normalize_tiers(tiers: &DataFrame) -> Result<DataFrame, FeasibilityError> {
    if tiers.height() == 0 || tiers.width() == 0 {
        return empty_tiers_frame();
    }

    let names: Vec<String> = tiers.get_column_names().iter().map(|s| s.to_string()).collect();
    let pick = |candidates: &[&str]| -> Option<String> {
        names
            .iter()
            .find(|n| candidates.contains(&n.trim().to_lowercase().as_str()))
            .cloned()
    };

    let county_col = pick(&["county", "county_name", "countyname"]).unwrap_or_else(|| names[0].clone());
    let tier_col = pick(&["tier", "mao tier", "mao_tier"]);
    let range_col = pick(&["mao range", "mao_range", "range"]);
    let min_col = pick(&["mao min", "mao_min", "min"]);
    let max_col = pick(&["mao max", "mao_max", "max"]);

    let county_clean: Vec<String> = str_column_values(tiers, &county_col)?
        .into_iter()
        .map(|opt| opt.map(|s| normalize_county(&s)).unwrap_or_default())
        .collect();
    let county_key: Vec<String> = county_clean.iter().map(|c| normalize_county_key(c)).collect();

    let tier: Vec<String> = match &tier_col {
        Some(col) => trimmed_values(tiers, col)?,
        None => vec![String::new(); tiers.height()],
    };

    let range: Vec<String> = match (&range_col, &min_col, &max_col) {
        (Some(col), _, _) => trimmed_values(tiers, col)?,
        (None, Some(lo), Some(hi)) => {
            let mins = f64_column_values(tiers, lo)?;
            let maxs = f64_column_values(tiers, hi)?;
            mins.into_iter()
                .zip(maxs)
                .map(|(lo, hi)| format_mao_range(lo.map(to_percent), hi.map(to_percent)))
                .collect()
        }
        _ => vec![String::new(); tiers.height()],
    };

    let df = DataFrame::new(vec![
        Series::new("County_clean_up".into(), county_clean).into(),
        Series::new("County_key".into(), county_key).into(),
        Series::new("MAO_Tier".into(), tier).into(),
        Series::new("MAO_Range_Str".into(), range).into(),
    ])?;

    Ok(df)
}

/// Left-join MAO tier columns onto the feed by `County_key`
///
/// The first tier row per key wins so the feed keeps one row per deal.
pub fn merge_tiers(deals: &mut DataFrame, tiers: &DataFrame) -> Result<(), FeasibilityError> {
    let mut lookup: FxHashMap<String, (String, String)> = FxHashMap::default();

    if tiers.height() > 0 {
        require_columns(tiers, &["County_key", "MAO_Tier", "MAO_Range_Str"], "MAO tiers")?;
        let keys = str_column_values(tiers, "County_key")?;
        let tier = str_column_values(tiers, "MAO_Tier")?;
        let range = str_column_values(tiers, "MAO_Range_Str")?;
        for ((key, tier), range) in keys.into_iter().zip(tier).zip(range) {
            if let Some(key) = key.filter(|k| !k.is_empty()) {
                lookup
                    .entry(key)
                    .or_insert((tier.unwrap_or_default(), range.unwrap_or_default()));
            }
        }
    }

    let keys = str_column_values(deals, "County_key")?;
    let (tier, range): (Vec<String>, Vec<String>) = keys
        .iter()
        .map(|key| {
            key.as_ref()
                .and_then(|k| lookup.get(k))
                .cloned()
                .unwrap_or_default()
        })
        .unzip();

    deals.with_column(Series::new("MAO_Tier".into(), tier))?;
    deals.with_column(Series::new("MAO_Range_Str".into(), range))?;
    Ok(())
}

/// Parse a sheet date; unrecognized text becomes None
///
/// Accepts `2024-03-01`, `3/1/2024`, `3/1/24` and timestamps starting with an
/// ISO date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if s.contains('/') {
        let year_digits = s.rsplit('/').next().map_or(0, |y| y.trim().len());
        let fmt = if year_digits == 2 { "%m/%d/%y" } else { "%m/%d/%Y" };
        return NaiveDate::parse_from_str(s, fmt).ok();
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| s.get(..10).and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()))
}

/// Read the normalized `Date_dt` column back as dates
pub fn date_column_values(df: &DataFrame) -> Result<Vec<Option<NaiveDate>>, FeasibilityError> {
    require_columns(df, &[DATE_COL], "deals feed")?;
    Ok(str_column_values(df, DATE_COL)?
        .into_iter()
        .map(|opt| opt.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()))
        .collect())
}

fn trimmed_values(df: &DataFrame, column: &str) -> Result<Vec<String>, FeasibilityError> {
    if !has_column(df, column) {
        return Ok(vec![String::new(); df.height()]);
    }
    Ok(str_column_values(df, column)?
        .into_iter()
        .map(|opt| opt.map(|s| s.trim().to_string()).unwrap_or_default())
        .collect())
}

fn to_percent(value: f64) -> f64 {
    if value <= 1.0 {
        value * 100.0
    } else {
        value
    }
}

fn format_mao_range(lo: Option<f64>, hi: Option<f64>) -> String {
    match (lo, hi) {
        (Some(lo), Some(hi)) => format!("{:.0}%–{:.0}%", lo, hi),
        (None, Some(hi)) => format!("≤{:.0}%", hi),
        (Some(lo), None) => format!("≥{:.0}%", lo),
        (None, None) => String::new(),
    }
}

fn empty_tiers_frame() -> Result<DataFrame, FeasibilityError> {
    let empty: Vec<String> = Vec::new();
    Ok(DataFrame::new(vec![
        Series::new("County_clean_up".into(), empty.clone()).into(),
        Series::new("County_key".into(), empty.clone()).into(),
        Series::new("MAO_Tier".into(), empty.clone()).into(),
        Series::new("MAO_Range_Str".into(), empty).into(),
    ])?)
}

fn empty_tiers() -> Result<DataFrame> {
    empty_tiers_frame().with_context(|| "Failed to build empty tiers frame")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn raw_feed() -> DataFrame {
        df![
            "County" => &["Davidson County", "shelby", "Stewart Couty", "Davidson"],
            "Status" => &["Sold", "Cut Loose", "closed", "pending"],
            "Contract Price" => &["$100,000", "90000", "", "$120,000"],
            "Amended Price" => &["$95,000", "", "", ""],
            "Wholesale Price" => &["$110,000", "", "", ""],
            "Buyer" => &[" Acme LLC ", "", "Beta", "Acme LLC"],
            "Date" => &["2024-03-01", "", "3/15/23", "01/02/2025"],
        ]
        .unwrap()
    }

    #[test]
    fn test_county_options_prefer_tier_sheet() {
        let deals = normalize_inputs(&raw_feed()).unwrap();
        let tiers = df![
            "County_clean_up" => &["WILSON", "DAVIDSON", "", "WILSON"],
            "County_key" => &["WILSON", "DAVIDSON", "", "WILSON"],
            "MAO_Tier" => &["A", "B", "", "A"],
            "MAO_Range_Str" => &["70%–75%", "65%–70%", "", "70%–75%"],
        ]
        .unwrap();

        let with_tiers = DealData {
            deals: deals.clone(),
            tiers,
            adjacency: CountyAdjacency::empty(),
        };
        assert_eq!(with_tiers.county_options().unwrap(), vec!["DAVIDSON", "WILSON"]);

        let without_tiers = DealData {
            deals,
            tiers: empty_tiers().unwrap(),
            adjacency: CountyAdjacency::empty(),
        };
        assert_eq!(
            without_tiers.county_options().unwrap(),
            vec!["DAVIDSON", "SHELBY", "STEWART"]
        );
    }

    #[test]
    fn test_normalize_inputs_columns() {
        let df = normalize_inputs(&raw_feed()).unwrap();

        let counties = str_column_values(&df, "County_clean_up").unwrap();
        assert_eq!(counties[0].as_deref(), Some("DAVIDSON"));
        assert_eq!(counties[2].as_deref(), Some("STEWART"));

        let status = str_column_values(&df, STATUS_COL).unwrap();
        assert_eq!(status[0].as_deref(), Some("sold"));
        assert_eq!(status[1].as_deref(), Some("cut loose"));
        assert_eq!(status[2].as_deref(), Some("sold"));
        assert_eq!(status[3].as_deref(), Some(""));

        let buyers = str_column_values(&df, BUYER_COL).unwrap();
        assert_eq!(buyers[0].as_deref(), Some("Acme LLC"));

        // Optional columns are synthesized
        assert!(has_column(&df, "Market_clean"));
        assert!(has_column(&df, "Salesforce_URL"));
    }

    #[test]
    fn test_effective_price_and_gross_profit() {
        let df = normalize_inputs(&raw_feed()).unwrap();
        let effective = f64_column_values(&df, "Effective_Contract_Price").unwrap();
        assert_eq!(effective, vec![Some(95000.0), Some(90000.0), None, Some(120000.0)]);

        let gross = f64_column_values(&df, "Gross_Profit").unwrap();
        assert_relative_eq!(gross[0].unwrap(), 15000.0);
        assert_eq!(gross[1], None);
    }

    #[test]
    fn test_dates_and_year() {
        let df = normalize_inputs(&raw_feed()).unwrap();
        let dates = date_column_values(&df).unwrap();
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(dates[1], None);
        assert_eq!(dates[2], NaiveDate::from_ymd_opt(2023, 3, 15));
        assert_eq!(dates[3], NaiveDate::from_ymd_opt(2025, 1, 2));
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-03-01T10:00:00Z"), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(parse_date("2024-03-01 00:00:00"), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_normalize_tiers_min_max() {
        let raw = df![
            "County " => &["Davidson County", "Shelby"],
            "Tier" => &["A", "B"],
            "MAO Min" => &[0.73, 70.0],
            "MAO Max" => &[0.77, 75.0],
        ]
        .unwrap();

        let tiers = normalize_tiers(&raw).unwrap();
        let keys = str_column_values(&tiers, "County_key").unwrap();
        let ranges = str_column_values(&tiers, "MAO_Range_Str").unwrap();
        assert_eq!(keys[0].as_deref(), Some("DAVIDSON"));
        assert_eq!(ranges[0].as_deref(), Some("73%–77%"));
        assert_eq!(ranges[1].as_deref(), Some("70%–75%"));
    }

    #[test]
    fn test_format_mao_range_open_ends() {
        assert_eq!(format_mao_range(None, Some(80.0)), "≤80%");
        assert_eq!(format_mao_range(Some(70.0), None), "≥70%");
        assert_eq!(format_mao_range(None, None), "");
    }

    #[test]
    fn test_from_frames_merges_tiers() {
        let tiers = df![
            "County" => &["Davidson"],
            "MAO Tier" => &["Tier 1"],
            "Range" => &["70%–75%"],
        ]
        .unwrap();

        let data = DealData::from_frames(raw_feed(), Some(tiers), CountyAdjacency::empty()).unwrap();
        let tier = str_column_values(&data.deals, "MAO_Tier").unwrap();
        assert_eq!(tier[0].as_deref(), Some("Tier 1"));
        assert_eq!(tier[1].as_deref(), Some(""));
        assert_eq!(data.counties().unwrap(), vec!["DAVIDSON", "SHELBY", "STEWART"]);

        let lookup = data.tier_lookup().unwrap();
        assert_eq!(lookup.get("DAVIDSON"), Some(&("Tier 1".to_string(), "70%–75%".to_string())));
    }

    #[test]
    fn test_from_frames_requires_columns() {
        let raw = df![
            "County" => &["Davidson"],
        ]
        .unwrap();
        assert!(DealData::from_frames(raw, None, CountyAdjacency::empty()).is_err());
    }
}
