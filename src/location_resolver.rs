//! Location Resolution Module
//!
//! This module resolves free-text location queries ("Paris, France") into
//! a [`ResolvedLocation`]. Resolution has no fallback: every failure mode is
//! a [`WeatherIntelError::Resolution`].

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::config::GeocodingConfig;
use crate::error::FetchError;
use crate::http::{self, HttpClient};
use crate::models::ResolvedLocation;
use crate::{Result, WeatherIntelError};

/// Turns a query into exactly one location
#[async_trait]
pub trait LocationResolver: Send + Sync {
    async fn resolve(&self, query: &str) -> Result<ResolvedLocation>;
}

/// OpenStreetMap Nominatim geocoder
pub struct NominatimResolver {
    client: HttpClient,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    display_name: String,
    lat: String,
    lon: String,
}

impl NominatimResolver {
    pub fn new(client: HttpClient, config: &GeocodingConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
        }
    }

    async fn search(&self, query: &str) -> std::result::Result<Vec<NominatimPlace>, FetchError> {
        let url = http::endpoint(
            &self.base_url,
            "search",
            [("q", query), ("format", "json"), ("limit", "1")],
        )?;
        http::get_json(self.client.get(url)).await
    }
}

#[async_trait]
impl LocationResolver for NominatimResolver {
    #[instrument(name = "resolve_location", skip(self))]
    async fn resolve(&self, query: &str) -> Result<ResolvedLocation> {
        debug!("Geocoding location query");

        let places = self.search(query).await.map_err(|e| {
            warn!("Geocoding request failed: {}", e);
            WeatherIntelError::resolution(format!("Geocoder error for '{query}': {e}"))
        })?;

        let place = places.into_iter().next().ok_or_else(|| {
            warn!("No results found for location '{}'", query);
            WeatherIntelError::resolution(format!("Location not found: {query}"))
        })?;

        let location = place_to_location(&place)?;
        info!(
            "Resolved '{}' to {} at ({})",
            query,
            location.display_name(),
            location.format_coordinates()
        );
        Ok(location)
    }
}

/// City is the first component of the display name, country the last
fn place_to_location(place: &NominatimPlace) -> Result<ResolvedLocation> {
    let lat = place.lat.trim().parse::<f64>().map_err(|_| {
        WeatherIntelError::resolution(format!("Invalid latitude from geocoder: {}", place.lat))
    })?;
    let lon = place.lon.trim().parse::<f64>().map_err(|_| {
        WeatherIntelError::resolution(format!("Invalid longitude from geocoder: {}", place.lon))
    })?;

    let city = place.display_name.split(',').next().unwrap_or_default().trim();
    let country = place.display_name.rsplit(',').next().unwrap_or_default().trim();

    ResolvedLocation::new(city, country, lat, lon)
}
