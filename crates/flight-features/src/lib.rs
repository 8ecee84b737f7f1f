//! Flight Feature Encoding
//!
//! Maps raw flight records onto the fixed 10-column feature schema used by
//! the delay classifier, and optionally derives the binary delay label.

mod calendar;
mod encoder;
mod record;
mod schema;

pub use calendar::{is_high_season, PeriodOfDay};
pub use encoder::{
    derive, encode, preprocess, preprocess_with_labels, DerivedFields, FeatureTable,
    DELAY_THRESHOLD_MINUTES,
};
pub use record::{parse_timestamp, RawFlightRecord, TIMESTAMP_FORMAT};
pub use schema::{FeatureColumn, FEATURE_BASIS, FEATURE_COLUMNS, FEATURE_COUNT, LABEL_COLUMN};

use thiserror::Error;

/// Errors raised while encoding a batch of records
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("Record {index}: missing required field {field}")]
    MissingField { index: usize, field: &'static str },
    #[error("Record {index}: cannot parse {field} value {value:?} as YYYY-MM-DD HH:MM:SS")]
    Parse {
        index: usize,
        field: &'static str,
        value: String,
    },
}
