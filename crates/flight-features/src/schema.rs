//! Fixed Feature Schema
//!
//! The column order must match what persisted models were trained on.

/// Number of columns in a feature row
pub const FEATURE_COUNT: usize = 10;

/// Name of the derived label column
pub const LABEL_COLUMN: &str = "delay";

/// One indicator column: "does this record's field equal the value"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureColumn {
    /// Airline (`OPERA_*`)
    Airline(&'static str),
    /// Month (`MES_*`)
    Month(i64),
    /// Flight type code (`TIPOVUELO_*`)
    FlightType(&'static str),
}

/// Ordered indicator basis, aligned with [`FEATURE_COLUMNS`]
pub const FEATURE_BASIS: [FeatureColumn; FEATURE_COUNT] = [
    FeatureColumn::Airline("Latin American Wings"),
    FeatureColumn::Month(7),
    FeatureColumn::Month(10),
    FeatureColumn::Airline("Grupo LATAM"),
    FeatureColumn::Month(12),
    FeatureColumn::FlightType("I"),
    FeatureColumn::Month(4),
    FeatureColumn::Month(11),
    FeatureColumn::Airline("Sky Airline"),
    FeatureColumn::Airline("Copa Air"),
];

/// Column names, in order
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "OPERA_Latin American Wings",
    "MES_7",
    "MES_10",
    "OPERA_Grupo LATAM",
    "MES_12",
    "TIPOVUELO_I",
    "MES_4",
    "MES_11",
    "OPERA_Sky Airline",
    "OPERA_Copa Air",
];

impl FeatureColumn {
    /// Column name as stored alongside a trained model
    pub fn name(&self) -> String {
        match self {
            FeatureColumn::Airline(value) => format!("OPERA_{value}"),
            FeatureColumn::Month(value) => format!("MES_{value}"),
            FeatureColumn::FlightType(value) => format!("TIPOVUELO_{value}"),
        }
    }

    /// Indicator value for a record's categorical fields
    pub fn indicator(&self, airline: &str, flight_type: &str, month: i64) -> f64 {
        let hit = match self {
            FeatureColumn::Airline(value) => airline == *value,
            FeatureColumn::Month(value) => month == *value,
            FeatureColumn::FlightType(value) => flight_type == *value,
        };
        if hit {
            1.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basis_names_match_columns() {
        for (column, name) in FEATURE_BASIS.iter().zip(FEATURE_COLUMNS) {
            assert_eq!(column.name(), name);
        }
    }

    #[test]
    fn test_indicator_exact_match_only() {
        let latam = FeatureColumn::Airline("Grupo LATAM");
        assert_eq!(latam.indicator("Grupo LATAM", "N", 1), 1.0);
        assert_eq!(latam.indicator("grupo latam", "N", 1), 0.0);
        assert_eq!(latam.indicator("Grupo LATAM ", "N", 1), 0.0);

        let international = FeatureColumn::FlightType("I");
        assert_eq!(international.indicator("x", "I", 1), 1.0);
        assert_eq!(international.indicator("x", "N", 1), 0.0);

        let july = FeatureColumn::Month(7);
        assert_eq!(july.indicator("x", "N", 7), 1.0);
        assert_eq!(july.indicator("x", "N", 8), 0.0);
    }
}
