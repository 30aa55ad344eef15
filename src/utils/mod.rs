//! Utility modules shared by the loaders and the calculator
//!
//! - Normalization: county keys, status labels, money strings
//! - Frame helpers: column validation and predicate filtering on DataFrames
//! - Format: currency and title-case display helpers

pub mod normalization;
pub mod frame_helpers;
pub mod format;

// Re-export commonly used helpers
pub use normalization::{
    normalize_county, normalize_county_key, normalize_status, parse_money, StatusNorm,
};
pub use frame_helpers::{require_columns, has_column, filter_by_str, str_column_values, f64_column_values};
pub use format::{dollars, dollars_opt, title_case};
