//! Calendar Derivations

use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Time-of-day bucket of a scheduled departure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodOfDay {
    /// [05:00, 12:00)
    Morning,
    /// [12:00, 19:00)
    Afternoon,
    /// [19:00, 05:00)
    Night,
}

impl PeriodOfDay {
    /// Bucket an hour of the day. Hours outside 0-23 fall into `Night`.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => PeriodOfDay::Morning,
            12..=18 => PeriodOfDay::Afternoon,
            _ => PeriodOfDay::Night,
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodOfDay::Morning => "morning",
            PeriodOfDay::Afternoon => "afternoon",
            PeriodOfDay::Night => "night",
        }
    }
}

/// Whether a date falls in a high-traffic window.
///
/// Windows (inclusive, any year): Dec 15-31, January, Feb 1-3, Jul 15-31,
/// Sep 11-30.
pub fn is_high_season<D: Datelike>(date: &D) -> bool {
    let day = date.day();
    match date.month() {
        12 => day >= 15,
        1 => true,
        2 => day <= 3,
        7 => day >= 15,
        9 => day >= 11,
        _ => false,
    }
}
