//! Validation Error Types

use serde::Serialize;
use thiserror::Error;

/// Errors during record validation
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationError {
    /// Value out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Value outside a closed set of codes
    #[error("{field} value {value:?} is not one of {allowed:?}")]
    NotAllowed {
        field: &'static str,
        value: String,
        allowed: &'static [&'static str],
    },

    /// Invalid data format
    #[error("Invalid data format for {field}: {value:?}")]
    InvalidFormat { field: &'static str, value: String },

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Error attached to a record position within a batch
    #[error("Record {index}: {error}")]
    AtRecord {
        index: usize,
        error: Box<ValidationError>,
    },
}
