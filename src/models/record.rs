//! Assembled weather request record

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DateRange, MapData, ResolvedLocation, SecondaryResults, WeatherSummary};

/// Output of one aggregation call. Owned by the caller once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRecord {
    pub id: Uuid,
    /// The free-text query as supplied by the caller
    pub location_query: String,
    pub resolved_location: ResolvedLocation,
    pub date_range: DateRange,
    /// Mandatory weather series
    pub primary_series: WeatherSummary,
    /// Optional enrichment, fetched once at creation
    pub secondary_results: SecondaryResults,
    pub map: MapData,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changes requested on an existing record. Absent fields keep their
/// stored values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordUpdate {
    #[serde(default)]
    pub location_query: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl RecordUpdate {
    /// New location query, if one was given and is not blank
    #[must_use]
    pub fn new_query(&self) -> Option<&str> {
        self.location_query
            .as_deref()
            .map(str::trim)
            .filter(|query| !query.is_empty())
    }

    /// Merge with the stored range. The result is not yet validated.
    #[must_use]
    pub fn merged_range(&self, current: &DateRange) -> DateRange {
        DateRange {
            start: self.start_date.unwrap_or(current.start),
            end: self.end_date.unwrap_or(current.end),
        }
    }
}
