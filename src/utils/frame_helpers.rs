//! DataFrame helpers with column validation
//!
//! Provides explicit patterns for pulling typed values out of Polars frames so
//! a renamed sheet column surfaces as a labeled error instead of a silent
//! empty result.

use crate::error::FeasibilityError;
use crate::utils::normalization::parse_money;
use polars::prelude::*;
use std::collections::HashSet;

/// Validate that every required column is present
///
/// # Arguments
/// * `df` - DataFrame to check
/// * `columns` - Required column names
/// * `context` - Context for error messages (e.g., "sold deals")
///
/// # Errors
/// `FeasibilityError::MissingColumn` naming the first absent column
pub fn require_columns(
    df: &DataFrame,
    columns: &[&str],
    context: &str,
) -> Result<(), FeasibilityError> {
    let actual_cols: HashSet<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    for &expected in columns {
        if !actual_cols.contains(expected) {
            return Err(FeasibilityError::missing_column(expected, context));
        }
    }

    Ok(())
}

/// True when the frame carries a column with this name
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

/// Read a column as optional strings, casting non-string dtypes
///
/// Numeric columns are rendered with Polars' own string cast, so a county
/// column that happens to parse as integers still comes back usable.
pub fn str_column_values(
    df: &DataFrame,
    column: &str,
) -> Result<Vec<Option<String>>, FeasibilityError> {
    let col = df.column(column)?;

    if matches!(col.dtype(), DataType::String) {
        return Ok(col
            .str()?
            .into_iter()
            .map(|opt| opt.map(|s| s.to_string()))
            .collect());
    }

    let casted = col.cast(&DataType::String)?;
    Ok(casted
        .str()?
        .into_iter()
        .map(|opt| opt.map(|s| s.to_string()))
        .collect())
}

/// Read a column as optional floats
///
/// String columns go through `parse_money` ("$74,000" → 74000.0); numeric
/// columns are cast to Float64. Unparsable or non-finite values become None.
pub fn f64_column_values(
    df: &DataFrame,
    column: &str,
) -> Result<Vec<Option<f64>>, FeasibilityError> {
    let col = df.column(column)?;

    if matches!(col.dtype(), DataType::String) {
        return Ok(col
            .str()?
            .into_iter()
            .map(|opt| opt.and_then(parse_money))
            .collect());
    }

    let casted = col.cast(&DataType::Float64)?;
    Ok(casted
        .f64()?
        .into_iter()
        .map(|opt| opt.filter(|v| v.is_finite()))
        .collect())
}

/// Filter a DataFrame with a predicate over one string column
///
/// Null cells never match.
pub fn filter_by_str<F>(
    df: &DataFrame,
    column: &str,
    context: &str,
    predicate: F,
) -> Result<DataFrame, FeasibilityError>
where
    F: Fn(&str) -> bool,
{
    require_columns(df, &[column], context)?;
    let values = str_column_values(df, column)?;

    let mask: BooleanChunked = values
        .iter()
        .map(|opt| opt.as_deref().map_or(false, &predicate))
        .collect();

    Ok(df.filter(&mask)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_columns_success() {
        let df = df![
            "County_clean_up" => &["DAVIDSON"],
            "Effective_Contract_Price" => &[100000.0],
        ]
        .unwrap();

        assert!(require_columns(&df, &["County_clean_up", "Effective_Contract_Price"], "test").is_ok());
    }

    #[test]
    fn test_require_columns_missing() {
        let df = df![
            "County_clean_up" => &["DAVIDSON"],
        ]
        .unwrap();

        let err = require_columns(&df, &["Effective_Contract_Price"], "sold deals").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("Effective_Contract_Price"));
    }

    #[test]
    fn test_f64_values_from_money_strings() {
        let df = df![
            "price" => &["$100,000", "", "n/a", "95000"],
        ]
        .unwrap();

        let values = f64_column_values(&df, "price").unwrap();
        assert_eq!(values, vec![Some(100000.0), None, None, Some(95000.0)]);
    }

    #[test]
    fn test_f64_values_from_integers() {
        let df = df![
            "price" => &[100000i64, 120000i64],
        ]
        .unwrap();

        let values = f64_column_values(&df, "price").unwrap();
        assert_eq!(values, vec![Some(100000.0), Some(120000.0)]);
    }

    #[test]
    fn test_filter_by_str() {
        let df = df![
            "County_clean_up" => &["DAVIDSON", "SHELBY", "DAVIDSON"],
            "n" => &[1, 2, 3],
        ]
        .unwrap();

        let filtered = filter_by_str(&df, "County_clean_up", "test", |c| c == "DAVIDSON").unwrap();
        assert_eq!(filtered.height(), 2);
    }

    #[test]
    fn test_filter_by_str_missing_column() {
        let df = df![
            "wrong" => &["x"],
        ]
        .unwrap();

        let result = filter_by_str(&df, "County_clean_up", "test", |_| true);
        assert!(result.is_err());
    }
}
