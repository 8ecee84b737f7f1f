//! Raw Flight Record

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp layout used by both departure fields
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One flight observation as received from the request layer.
///
/// Fields are optional so that missing values surface as encoder or
/// validation errors instead of deserialization failures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFlightRecord {
    /// Carrier name (open vocabulary)
    #[serde(rename = "OPERA", default)]
    pub airline: Option<String>,
    /// Flight type code: `N` (national) or `I` (international)
    #[serde(rename = "TIPOVUELO", default)]
    pub flight_type: Option<String>,
    /// Month of operation, 1-12
    #[serde(rename = "MES", default)]
    pub month: Option<i64>,
    /// Scheduled departure
    #[serde(rename = "Fecha_I", alias = "Fecha-I", default)]
    pub scheduled_departure: Option<String>,
    /// Actual departure
    #[serde(rename = "Fecha_O", alias = "Fecha-O", default)]
    pub actual_departure: Option<String>,
}

impl RawFlightRecord {
    /// Build a fully populated record
    pub fn new(
        airline: &str,
        flight_type: &str,
        month: i64,
        scheduled_departure: &str,
        actual_departure: &str,
    ) -> Self {
        Self {
            airline: Some(airline.to_string()),
            flight_type: Some(flight_type.to_string()),
            month: Some(month),
            scheduled_departure: Some(scheduled_departure.to_string()),
            actual_departure: Some(actual_departure.to_string()),
        }
    }
}

/// Parse a departure timestamp in [`TIMESTAMP_FORMAT`]
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT).ok()
}
