//! Request date window

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Result, WeatherIntelError};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive date range of a weather request.
///
/// Fields are public so stored records can be read back as-is; anything that
/// issues external calls must call [`DateRange::validate`] first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(rename = "start_date")]
    pub start: NaiveDate,
    #[serde(rename = "end_date")]
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a validated range
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    /// Parse `YYYY-MM-DD` strings into a validated range
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.start > self.end {
            return Err(WeatherIntelError::validation(format!(
                "Start date {} must not be after end date {}",
                self.start, self.end
            )));
        }
        Ok(())
    }

    /// Number of calendar days covered, both ends included
    #[must_use]
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    #[must_use]
    pub fn start_str(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    #[must_use]
    pub fn end_str(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

/// Parse a single `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        WeatherIntelError::validation(format!("Invalid date '{value}', expected YYYY-MM-DD"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_valid_range() {
        let range = DateRange::parse("2024-06-01", "2024-06-05").unwrap();
        assert_eq!(range.days(), 5);
        assert_eq!(range.start_str(), "2024-06-01");
        assert_eq!(range.end_str(), "2024-06-05");
    }

    #[test]
    fn test_single_day_range_is_valid() {
        let range = DateRange::parse("2024-06-01", "2024-06-01").unwrap();
        assert_eq!(range.days(), 1);
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let result = DateRange::parse("2024-06-05", "2024-06-01");
        assert!(matches!(result, Err(WeatherIntelError::Validation { .. })));
    }

    #[rstest]
    #[case("2024/06/01")]
    #[case("June 1st")]
    #[case("2024-13-01")]
    #[case("")]
    fn test_bad_dates_are_validation_errors(#[case] input: &str) {
        assert!(matches!(
            parse_date(input),
            Err(WeatherIntelError::Validation { .. })
        ));
    }

    #[test]
    fn test_serialized_field_names() {
        let range = DateRange::parse("2024-06-01", "2024-06-05").unwrap();
        let json = serde_json::to_value(range).unwrap();
        assert_eq!(json["start_date"], "2024-06-01");
        assert_eq!(json["end_date"], "2024-06-05");
    }
}
