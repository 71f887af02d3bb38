//! Aggregation pipeline
//!
//! Resolution, primary series and secondary fan-out run strictly in that
//! order. The first two are fatal, the fan-out never is.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::WeatherIntelConfig;
use crate::http::HttpClient;
use crate::location_resolver::{LocationResolver, NominatimResolver};
use crate::models::{AggregateRecord, DateRange, MapData, RecordUpdate, ResolvedLocation};
use crate::sources::SecondarySources;
use crate::weather::PrimarySeriesFetcher;
use crate::{Result, WeatherIntelError};

pub struct Aggregator {
    resolver: Arc<dyn LocationResolver>,
    weather: PrimarySeriesFetcher,
    sources: SecondarySources,
    timeout: Duration,
}

impl Aggregator {
    pub fn new(
        resolver: Arc<dyn LocationResolver>,
        weather: PrimarySeriesFetcher,
        sources: SecondarySources,
        timeout: Duration,
    ) -> Self {
        Self {
            resolver,
            weather,
            sources,
            timeout,
        }
    }

    /// Wire every collaborator from configuration, sharing one HTTP client
    pub fn from_config(client: HttpClient, config: &WeatherIntelConfig) -> Self {
        let timeout = config.aggregator.collaborator_timeout();
        let aggregator = Self::new(
            Arc::new(NominatimResolver::new(client.clone(), &config.geocoding)),
            PrimarySeriesFetcher::from_config(client.clone(), &config.weather, timeout),
            SecondarySources::from_config(client, &config.sources),
            timeout,
        );
        info!(
            "Aggregator ready: weather providers {:?}, secondary sources {:?}",
            aggregator.weather.provider_names(),
            aggregator.sources.configured()
        );
        aggregator
    }

    /// Build a complete record for a location query and date range
    #[instrument(skip(self, range, user_id), fields(start = %range.start, end = %range.end))]
    pub async fn aggregate(
        &self,
        query: &str,
        range: DateRange,
        user_id: Option<String>,
    ) -> Result<AggregateRecord> {
        let query = query.trim();
        if query.is_empty() {
            return Err(WeatherIntelError::validation("Location query must not be empty"));
        }
        range.validate()?;

        let location = self.resolve(query).await?;
        let primary_series = self
            .weather
            .fetch_primary_series(location.lat, location.lon, &range)
            .await?;
        let secondary_results = self.sources.fetch_all(&location, self.timeout).await;

        let empty = secondary_results.empty_sources();
        if !empty.is_empty() {
            debug!("Secondary sources without data: {:?}", empty);
        }

        let now = Utc::now();
        let record = AggregateRecord {
            id: Uuid::new_v4(),
            location_query: query.to_string(),
            map: MapData::for_location(&location),
            resolved_location: location,
            date_range: range,
            primary_series,
            secondary_results,
            user_id: user_id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
            created_at: now,
            updated_at: now,
        };

        info!(
            "Aggregated {} for {} ({} of 6 secondary sources available)",
            record.id,
            record.resolved_location.display_name(),
            6 - empty.len()
        );
        Ok(record)
    }

    /// Re-fetch the primary series for an updated query or range.
    ///
    /// Secondary results are kept as they were. The input record is never
    /// modified; on error nothing changes.
    #[instrument(skip(self, record, update), fields(id = %record.id))]
    pub async fn refresh(
        &self,
        record: &AggregateRecord,
        update: &RecordUpdate,
    ) -> Result<AggregateRecord> {
        let range = update.merged_range(&record.date_range);
        range.validate()?;

        let (location_query, location) = match update.new_query() {
            Some(query) => (query.to_string(), self.resolve(query).await?),
            None => (
                record.location_query.clone(),
                record.resolved_location.clone(),
            ),
        };

        let primary_series = self
            .weather
            .fetch_primary_series(location.lat, location.lon, &range)
            .await?;

        let mut updated = record.clone();
        if location != record.resolved_location {
            updated.map = MapData::for_location(&location);
        }
        updated.location_query = location_query;
        updated.resolved_location = location;
        updated.date_range = range;
        updated.primary_series = primary_series;
        updated.updated_at = Utc::now();

        info!("Refreshed {}", updated.id);
        Ok(updated)
    }

    async fn resolve(&self, query: &str) -> Result<ResolvedLocation> {
        tokio::time::timeout(self.timeout, self.resolver.resolve(query))
            .await
            .map_err(|_| {
                WeatherIntelError::resolution(format!(
                    "Geocoder did not answer within {:?} for '{query}'",
                    self.timeout
                ))
            })?
    }
}
