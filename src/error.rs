//! Error types for contest-split.
//!
//! Every failure of a run maps onto one of these variants. Input problems
//! (missing columns, missing fields) are reported with enough context to find
//! the offending row; registry lookups that miss are invariant violations.

use thiserror::Error;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Input file lacks one or more required headers
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A record lacks a required attribute
    #[error("Line {line}: required field '{field}' is missing or empty")]
    MissingField { line: u64, field: String },

    /// Registry lookup for an id that was never assigned
    #[error("Institution id {0} not found in registry")]
    NotFound(u32),

    /// Input could not be compared as text
    #[error("Cannot compare institution names: {0}")]
    ScoreComparison(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn missing_field(line: u64, field: &str) -> Self {
        Error::MissingField {
            line,
            field: field.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message_lists_all() {
        let err = Error::MissingColumns(vec!["Advisor".to_string(), "Ranking".to_string()]);
        assert_eq!(err.to_string(), "Missing required columns: Advisor, Ranking");
    }

    #[test]
    fn test_missing_field_message_has_line() {
        let err = Error::missing_field(4, "Institution");
        assert_eq!(
            err.to_string(),
            "Line 4: required field 'Institution' is missing or empty"
        );
    }
}
