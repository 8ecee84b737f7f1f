//! Record Validator

use crate::error::ValidationError;
use flight_features::{parse_timestamp, RawFlightRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Permitted flight type codes
pub const FLIGHT_TYPES: &[&str] = &["N", "I"];

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Month valid range (inclusive)
    pub month_range: (i64, i64),
    /// Whether the actual departure timestamp must be present
    pub require_actual_departure: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            month_range: (1, 12),
            require_actual_departure: false,
        }
    }
}

impl ValidationConfig {
    /// Config for training data, where the label needs both timestamps
    pub fn training() -> Self {
        Self {
            require_actual_departure: true,
            ..Self::default()
        }
    }
}

/// Result of validating a batch
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether all records are valid
    pub valid: bool,
    /// List of validation errors, each tagged with its record index
    pub errors: Vec<ValidationError>,
    /// Number of records checked
    pub records_checked: usize,
}

impl ValidationResult {
    /// Convert into a `Result`, keeping every error on failure
    pub fn into_result(self) -> Result<usize, Vec<ValidationError>> {
        if self.valid {
            Ok(self.records_checked)
        } else {
            Err(self.errors)
        }
    }
}

/// Validator for raw flight records
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a value against an inclusive range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: i64,
        range: (i64, i64),
    ) -> Result<(), ValidationError> {
        if value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    /// Validate the month field
    pub fn validate_month(&self, month: Option<i64>) -> Result<(), ValidationError> {
        let month = month.ok_or(ValidationError::MissingField("MES"))?;
        self.validate_range("MES", month, self.config.month_range)
    }

    /// Validate the flight type code
    pub fn validate_flight_type(&self, flight_type: Option<&str>) -> Result<(), ValidationError> {
        let flight_type = flight_type.ok_or(ValidationError::MissingField("TIPOVUELO"))?;
        if FLIGHT_TYPES.contains(&flight_type) {
            Ok(())
        } else {
            Err(ValidationError::NotAllowed {
                field: "TIPOVUELO",
                value: flight_type.to_string(),
                allowed: FLIGHT_TYPES,
            })
        }
    }

    /// Validate the airline name
    pub fn validate_airline(&self, airline: Option<&str>) -> Result<(), ValidationError> {
        match airline {
            None => Err(ValidationError::MissingField("OPERA")),
            Some(a) if a.trim().is_empty() => Err(ValidationError::InvalidFormat {
                field: "OPERA",
                value: a.to_string(),
            }),
            Some(_) => Ok(()),
        }
    }

    /// Validate a departure timestamp
    pub fn validate_timestamp(
        &self,
        field: &'static str,
        value: Option<&str>,
        required: bool,
    ) -> Result<(), ValidationError> {
        match value {
            None if required => Err(ValidationError::MissingField(field)),
            None => Ok(()),
            Some(v) if parse_timestamp(v).is_none() => Err(ValidationError::InvalidFormat {
                field,
                value: v.to_string(),
            }),
            Some(_) => Ok(()),
        }
    }

    /// Validate every field of a record, collecting all errors
    pub fn validate_record(&self, record: &RawFlightRecord) -> Vec<ValidationError> {
        [
            self.validate_airline(record.airline.as_deref()),
            self.validate_flight_type(record.flight_type.as_deref()),
            self.validate_month(record.month),
            self.validate_timestamp("Fecha_I", record.scheduled_departure.as_deref(), true),
            self.validate_timestamp(
                "Fecha_O",
                record.actual_departure.as_deref(),
                self.config.require_actual_departure,
            ),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect()
    }

    /// Validate a batch; errors carry the offending record index
    pub fn validate_batch(&self, records: &[RawFlightRecord]) -> ValidationResult {
        let errors: Vec<_> = records
            .iter()
            .enumerate()
            .flat_map(|(index, record)| {
                self.validate_record(record)
                    .into_iter()
                    .map(move |error| ValidationError::AtRecord {
                        index,
                        error: Box::new(error),
                    })
            })
            .collect();

        if !errors.is_empty() {
            debug!("Rejected batch of {} records: {} errors", records.len(), errors.len());
        }

        ValidationResult {
            valid: errors.is_empty(),
            errors,
            records_checked: records.len(),
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
