//! Time-window filtering
//!
//! Splits the normalized feed into sold and cut-loose tables for one window.
//! Cut-loose records are often entered without a date, so year and rolling
//! windows keep undated cut-loose rows instead of dropping them.
//!
//! `AdminFilter` narrows an already-split window to one market, acquisition
//! rep or disposition rep.

use crate::data::{date_column_values, STATUS_COL};
use crate::error::FeasibilityError;
use crate::utils::{has_column, require_columns, str_column_values, StatusNorm};
use chrono::{Datelike, Months, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Reporting window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TimeWindow {
    AllYears,
    Year { year: i32 },
    /// Rolling window ending on `today` (inclusive)
    Last12Months { today: NaiveDate },
}

impl TimeWindow {
    /// Parse a dropdown choice: "All years", "Last 12 months" or a year
    pub fn parse(choice: &str, today: NaiveDate) -> Option<Self> {
        match choice.trim() {
            "" | "All years" => Some(TimeWindow::AllYears),
            "Last 12 months" | "Rolling 12 months" => Some(TimeWindow::Last12Months { today }),
            other => other.parse::<i32>().ok().map(|year| TimeWindow::Year { year }),
        }
    }

    pub fn label(&self) -> String {
        match self {
            TimeWindow::AllYears => "All years".to_string(),
            TimeWindow::Year { year } => year.to_string(),
            TimeWindow::Last12Months { .. } => "Last 12 months".to_string(),
        }
    }

    /// Whether a dated row falls inside the window
    fn contains(&self, date: NaiveDate) -> bool {
        match self {
            TimeWindow::AllYears => true,
            TimeWindow::Year { year } => date.year() == *year,
            TimeWindow::Last12Months { today } => {
                let start = today.checked_sub_months(Months::new(12)).unwrap_or(NaiveDate::MIN);
                date >= start && date <= *today
            }
        }
    }
}

/// Sold and cut-loose tables for one window
#[derive(Debug, Clone)]
pub struct WindowedDeals {
    pub sold: DataFrame,
    pub cut: DataFrame,
}

impl WindowedDeals {
    /// Sold rows followed by cut-loose rows
    pub fn both(&self) -> Result<DataFrame, FeasibilityError> {
        Ok(self.sold.vstack(&self.cut)?)
    }
}

/// Split the normalized feed by status and window
///
/// Sold rows need a date inside the window (except for `AllYears`); cut-loose
/// rows pass when their date is inside the window or missing. Rows with any
/// other status are dropped.
pub fn split_by_window(df: &DataFrame, window: &TimeWindow) -> Result<WindowedDeals, FeasibilityError> {
    require_columns(df, &[STATUS_COL], "deals feed")?;

    let status: Vec<StatusNorm> = str_column_values(df, STATUS_COL)?
        .into_iter()
        .map(|opt| opt.map_or(StatusNorm::Unknown, |s| StatusNorm::from_label(&s)))
        .collect();

    let dates = match window {
        TimeWindow::AllYears => vec![None; df.height()],
        _ => date_column_values(df)?,
    };

    let (mut sold_mask, mut cut_mask) = (Vec::with_capacity(status.len()), Vec::with_capacity(status.len()));
    for (status, date) in status.iter().zip(&dates) {
        let in_window = match (window, date) {
            (TimeWindow::AllYears, _) => true,
            (_, Some(d)) => window.contains(*d),
            (_, None) => false,
        };
        sold_mask.push(*status == StatusNorm::Sold && in_window);
        cut_mask.push(*status == StatusNorm::CutLoose && (in_window || date.is_none()));
    }

    let sold_mask: BooleanChunked = sold_mask.into_iter().collect();
    let cut_mask: BooleanChunked = cut_mask.into_iter().collect();

    let windowed = WindowedDeals {
        sold: df.filter(&sold_mask)?,
        cut: df.filter(&cut_mask)?,
    };

    tracing::debug!(
        window = %window.label(),
        sold = windowed.sold.height(),
        cut = windowed.cut.height(),
        "split feed by window"
    );

    Ok(windowed)
}

const DISPO_REP_COL: &str = "Dispo_Rep_clean";
const MARKET_COL: &str = "Market_clean";
const ACQ_REP_COL: &str = "Acquisition_Rep_clean";

/// Optional exact-match filters over the cleaned rep and market columns
///
/// `None` (or a blank value) means "all". Filters run in the order dispo
/// rep, market, acquisition rep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminFilter {
    pub market: Option<String>,
    pub acquisition_rep: Option<String>,
    pub dispo_rep: Option<String>,
}

impl AdminFilter {
    fn active(&self) -> Vec<(&'static str, &str)> {
        [
            (DISPO_REP_COL, &self.dispo_rep),
            (MARKET_COL, &self.market),
            (ACQ_REP_COL, &self.acquisition_rep),
        ]
        .into_iter()
        .filter_map(|(column, choice)| {
            choice
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(|c| (column, c))
        })
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.active().is_empty()
    }

    /// Cache / log key, e.g. "dispo=Kim|market=|acq="
    pub fn key(&self) -> String {
        format!(
            "dispo={}|market={}|acq={}",
            self.dispo_rep.as_deref().unwrap_or("").trim(),
            self.market.as_deref().unwrap_or("").trim(),
            self.acquisition_rep.as_deref().unwrap_or("").trim(),
        )
    }

    /// Apply the filters to a windowed split
    ///
    /// A filter is skipped when the sold table lacks its column. When it
    /// applies, the cut-loose table is narrowed too if it has the column.
    pub fn apply(&self, deals: &WindowedDeals) -> Result<WindowedDeals, FeasibilityError> {
        let mut sold = deals.sold.clone();
        let mut cut = deals.cut.clone();

        for (column, choice) in self.active() {
            if !has_column(&sold, column) {
                continue;
            }
            sold = keep_equal(&sold, column, choice)?;
            if has_column(&cut, column) {
                cut = keep_equal(&cut, column, choice)?;
            }
        }

        tracing::debug!(
            filter = %self.key(),
            sold = sold.height(),
            cut = cut.height(),
            "applied admin filters"
        );

        Ok(WindowedDeals { sold, cut })
    }
}

/// Rows whose `column` equals `value`; nulls never match
fn keep_equal(df: &DataFrame, column: &str, value: &str) -> Result<DataFrame, FeasibilityError> {
    Ok(df
        .clone()
        .lazy()
        .filter(col(column).eq(lit(value)))
        .collect()?)
}

/// Distinct years with at least one dated row, ascending
pub fn years_available(df: &DataFrame) -> Result<Vec<i32>, FeasibilityError> {
    let years: BTreeSet<i32> = date_column_values(df)?
        .into_iter()
        .flatten()
        .map(|d| d.year())
        .collect();
    Ok(years.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed() -> DataFrame {
        df![
            "Status_norm" => &["sold", "sold", "cut loose", "cut loose", "sold", ""],
            "Date_dt" => &[Some("2024-05-01"), Some("2023-02-01"), Some("2023-06-01"), None, None, Some("2024-01-01")],
        ]
        .unwrap()
    }

    #[test]
    fn test_all_years_splits_by_status() {
        let split = split_by_window(&feed(), &TimeWindow::AllYears).unwrap();
        assert_eq!(split.sold.height(), 3);
        assert_eq!(split.cut.height(), 2);
        assert_eq!(split.both().unwrap().height(), 5);
    }

    #[test]
    fn test_year_keeps_undated_cuts() {
        let split = split_by_window(&feed(), &TimeWindow::Year { year: 2024 }).unwrap();
        assert_eq!(split.sold.height(), 1);
        // Only the undated cut-loose row; the 2023 cut is outside the year
        assert_eq!(split.cut.height(), 1);
    }

    #[test]
    fn test_last_12_months() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let split = split_by_window(&feed(), &TimeWindow::Last12Months { today }).unwrap();
        assert_eq!(split.sold.height(), 1);
        assert_eq!(split.cut.height(), 2);
    }

    #[test]
    fn test_parse_choice() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(TimeWindow::parse("All years", today), Some(TimeWindow::AllYears));
        assert_eq!(TimeWindow::parse("2023", today), Some(TimeWindow::Year { year: 2023 }));
        assert_eq!(
            TimeWindow::parse("Last 12 months", today),
            Some(TimeWindow::Last12Months { today })
        );
        assert_eq!(TimeWindow::parse("someday", today), None);
    }

    fn rep_split() -> WindowedDeals {
        WindowedDeals {
            sold: df![
                "County_clean_up" => &["DAVIDSON", "DAVIDSON", "KNOX", "KNOX"],
                "Dispo_Rep_clean" => &[Some("Kim"), Some("Lee"), Some("Kim"), None],
                "Market_clean" => &["Nashville", "Nashville", "Knoxville", "Knoxville"],
                "Acquisition_Rep_clean" => &["Ana", "Bo", "Bo", "Ana"],
            ]
            .unwrap(),
            cut: df![
                "County_clean_up" => &["DAVIDSON", "KNOX", "KNOX"],
                "Dispo_Rep_clean" => &["Kim", "Lee", "Kim"],
                "Market_clean" => &["Nashville", "Knoxville", "Knoxville"],
            ]
            .unwrap(),
        }
    }

    #[test]
    fn test_admin_filter_dispo_rep_narrows_both_tables() {
        let filter = AdminFilter {
            dispo_rep: Some("Kim".to_string()),
            ..Default::default()
        };
        let out = filter.apply(&rep_split()).unwrap();
        assert_eq!(out.sold.height(), 2);
        assert_eq!(out.cut.height(), 2);
    }

    #[test]
    fn test_admin_filter_combines_market_and_rep() {
        let filter = AdminFilter {
            market: Some("Knoxville".to_string()),
            acquisition_rep: Some("Bo".to_string()),
            dispo_rep: None,
        };
        let out = filter.apply(&rep_split()).unwrap();
        assert_eq!(out.sold.height(), 1);
        assert_eq!(str_column_values(&out.sold, "County_clean_up").unwrap()[0].as_deref(), Some("KNOX"));
        // Cut table has no acquisition rep column, so only the market applies
        assert_eq!(out.cut.height(), 2);
    }

    #[test]
    fn test_admin_filter_blank_or_missing_column_is_noop() {
        let split = rep_split();
        let blank = AdminFilter {
            market: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(blank.is_empty());
        assert_eq!(blank.apply(&split).unwrap().sold.height(), 4);

        let no_column = AdminFilter {
            dispo_rep: Some("Kim".to_string()),
            ..Default::default()
        };
        let bare = WindowedDeals {
            sold: df!["County_clean_up" => &["DAVIDSON"]].unwrap(),
            cut: df!["County_clean_up" => &["KNOX"]].unwrap(),
        };
        let out = no_column.apply(&bare).unwrap();
        assert_eq!(out.sold.height(), 1);
        assert_eq!(out.cut.height(), 1);
    }

    #[test]
    fn test_admin_filter_key() {
        let filter = AdminFilter {
            dispo_rep: Some(" Kim ".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.key(), "dispo=Kim|market=|acq=");
    }

    #[test]
    fn test_years_available() {
        assert_eq!(years_available(&feed()).unwrap(), vec![2023, 2024]);
    }
}
