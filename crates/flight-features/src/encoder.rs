//! Feature Table Assembly

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::{is_high_season, PeriodOfDay};
use crate::record::{parse_timestamp, RawFlightRecord};
use crate::schema::{FEATURE_BASIS, FEATURE_COLUMNS, FEATURE_COUNT};
use crate::EncodeError;

/// A flight counts as delayed when it leaves strictly later than this
pub const DELAY_THRESHOLD_MINUTES: f64 = 15.0;

/// Per-record fields computed from the raw timestamps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedFields {
    pub period_of_day: PeriodOfDay,
    pub high_season: bool,
    /// Actual minus scheduled departure, in minutes (only when labelling)
    pub delay_minutes: Option<f64>,
    /// `delay_minutes > 15` (only when labelling)
    pub is_delayed: Option<bool>,
}

/// Fixed-width feature rows in [`FEATURE_COLUMNS`] order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    rows: Vec<[f64; FEATURE_COUNT]>,
}

impl FeatureTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap pre-built rows
    pub fn from_rows(rows: Vec<[f64; FEATURE_COUNT]>) -> Self {
        Self { rows }
    }

    /// Column names, in order
    pub fn columns(&self) -> &'static [&'static str; FEATURE_COUNT] {
        &FEATURE_COLUMNS
    }

    pub fn rows(&self) -> &[[f64; FEATURE_COUNT]] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[f64; FEATURE_COUNT]> {
        self.rows.get(index)
    }

    /// Values of a named column, top to bottom
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = FEATURE_COLUMNS.iter().position(|c| *c == name)?;
        Some(self.rows.iter().map(|row| row[idx]).collect())
    }

    pub fn push_row(&mut self, row: [f64; FEATURE_COUNT]) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Compute the derived calendar fields (and the label, if asked) for one record
pub fn derive(record: &RawFlightRecord, derive_label: bool) -> Result<DerivedFields, EncodeError> {
    derive_at(0, record, derive_label)
}

fn derive_at(
    index: usize,
    record: &RawFlightRecord,
    derive_label: bool,
) -> Result<DerivedFields, EncodeError> {
    let scheduled = required_timestamp(index, "Fecha_I", record.scheduled_departure.as_deref())?;

    let (delay_minutes, is_delayed) = if derive_label {
        let actual = required_timestamp(index, "Fecha_O", record.actual_departure.as_deref())?;
        let minutes = (actual - scheduled).num_seconds() as f64 / 60.0;
        (Some(minutes), Some(minutes > DELAY_THRESHOLD_MINUTES))
    } else {
        (None, None)
    };

    Ok(DerivedFields {
        period_of_day: PeriodOfDay::from_hour(scheduled.hour()),
        high_season: is_high_season(&scheduled),
        delay_minutes,
        is_delayed,
    })
}

fn required_timestamp(
    index: usize,
    field: &'static str,
    value: Option<&str>,
) -> Result<chrono::NaiveDateTime, EncodeError> {
    let value = value.ok_or(EncodeError::MissingField { index, field })?;
    parse_timestamp(value).ok_or_else(|| EncodeError::Parse {
        index,
        field,
        value: value.to_string(),
    })
}

fn encode_row(index: usize, record: &RawFlightRecord) -> Result<[f64; FEATURE_COUNT], EncodeError> {
    let airline = record
        .airline
        .as_deref()
        .ok_or(EncodeError::MissingField { index, field: "OPERA" })?;
    let flight_type = record
        .flight_type
        .as_deref()
        .ok_or(EncodeError::MissingField { index, field: "TIPOVUELO" })?;
    let month = record
        .month
        .ok_or(EncodeError::MissingField { index, field: "MES" })?;

    let mut row = [0.0; FEATURE_COUNT];
    for (slot, column) in row.iter_mut().zip(FEATURE_BASIS.iter()) {
        *slot = column.indicator(airline, flight_type, month);
    }
    Ok(row)
}

/// Encode a batch into a feature table, plus the aligned `delay` label
/// column when `derive_label` is set.
///
/// Fails on the first record with a missing or unparseable field; no
/// partial table is returned.
pub fn encode(
    records: &[RawFlightRecord],
    derive_label: bool,
) -> Result<(FeatureTable, Option<Vec<u8>>), EncodeError> {
    let mut features = FeatureTable::from_rows(Vec::with_capacity(records.len()));
    let mut labels = derive_label.then(|| Vec::with_capacity(records.len()));
    let mut high_season_count = 0usize;

    for (index, record) in records.iter().enumerate() {
        let derived = derive_at(index, record, derive_label)?;
        if derived.high_season {
            high_season_count += 1;
        }
        if let (Some(labels), Some(delayed)) = (labels.as_mut(), derived.is_delayed) {
            labels.push(u8::from(delayed));
        }
        features.push_row(encode_row(index, record)?);
    }

    debug!(
        "Encoded {} records into {}x{} features ({} in high season, labels={})",
        records.len(),
        features.len(),
        FEATURE_COUNT,
        high_season_count,
        derive_label
    );

    Ok((features, labels))
}

/// Serving-path encoding: features only
pub fn preprocess(records: &[RawFlightRecord]) -> Result<FeatureTable, EncodeError> {
    encode(records, false).map(|(features, _)| features)
}

/// Training-path encoding: features and the `delay` label column
pub fn preprocess_with_labels(
    records: &[RawFlightRecord],
) -> Result<(FeatureTable, Vec<u8>), EncodeError> {
    let (features, labels) = encode(records, true)?;
    Ok((features, labels.unwrap_or_default()))
}
