//! Labeled failures for the feasibility engine
//!
//! The Display text of every variant is meant to be shown to the user verbatim,
//! so keep messages short and free of internal type names.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeasibilityError {
    /// A required column is absent from an input table (configuration error)
    #[error("{context}: missing {column} field. (Check data::normalize_inputs.)")]
    MissingColumn { column: String, context: String },

    /// A caller-supplied price is not a finite number
    #[error("Invalid input price: {0}")]
    InvalidPrice(f64),

    #[error("Data frame error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FeasibilityError {
    pub fn missing_column(column: &str, context: &str) -> Self {
        FeasibilityError::MissingColumn {
            column: column.to_string(),
            context: context.to_string(),
        }
    }

    /// True for errors caused by the shape of the caller's input rather than I/O
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FeasibilityError::MissingColumn { .. } | FeasibilityError::InvalidPrice(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_label() {
        let err = FeasibilityError::missing_column("Effective_Contract_Price", "sold deals");
        let msg = err.to_string();
        assert!(msg.contains("Effective_Contract_Price"));
        assert!(msg.starts_with("sold deals"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_io_is_not_configuration() {
        let err: FeasibilityError = std::io::Error::new(std::io::ErrorKind::NotFound, "x").into();
        assert!(!err.is_configuration());
    }
}
