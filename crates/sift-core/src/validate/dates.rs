//! Date normalization.

use chrono::{Datelike, NaiveDate};

use super::ValueNormalizer;

/// Accepted input formats, tried in order.
pub const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%d %B %Y",
    "%B %d, %Y",
    "%d %b %Y",
];

/// Normalizes dates to `YYYY-MM-DD`.
pub struct DateNormalizer {
    allow_range: bool,
}

impl DateNormalizer {
    pub fn new(allow_range: bool) -> Self {
        Self { allow_range }
    }
}

/// Parse `value` with the first matching format.
///
/// Years must have four digits; `%Y` alone would read `25` as year 25.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .find(|date| (1000..=9999).contains(&date.year()))
}

impl ValueNormalizer for DateNormalizer {
    fn normalize(&self, value: &str) -> Result<String, String> {
        if let Some(date) = parse_date(value) {
            return Ok(date.format("%Y-%m-%d").to_string());
        }
        if self.allow_range && value.to_lowercase().contains(" to ") {
            return Ok(value.to_string());
        }
        Err(format!("Invalid date format '{}'", value))
    }
}
