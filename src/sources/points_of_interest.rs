//! Nearby attractions from OpenTripMap

use async_trait::async_trait;
use serde::Deserialize;

use super::SecondarySource;
use crate::config::SourceConfig;
use crate::error::FetchError;
use crate::http::{self, HttpClient};
use crate::models::{PointOfInterest, ResolvedLocation, SourceKind};

const RADIUS_METERS: &str = "5000";
const LIMIT: &str = "10";

pub struct PointsOfInterestSource {
    client: HttpClient,
    api_key: Option<String>,
    base_url: String,
    enabled: bool,
}

impl PointsOfInterestSource {
    pub fn new(client: HttpClient, config: &SourceConfig) -> Self {
        Self {
            client,
            api_key: config.key().map(str::to_string),
            base_url: config.base_url.clone(),
            enabled: config.enabled,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Place {
    #[serde(default)]
    name: String,
    #[serde(default)]
    kinds: String,
    point: PlacePoint,
}

#[derive(Debug, Deserialize)]
struct PlacePoint {
    lon: f64,
    lat: f64,
}

impl Place {
    fn into_poi(self) -> Option<PointOfInterest> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }
        Some(PointOfInterest {
            name: name.to_string(),
            kind: self.kinds.split(',').next().unwrap_or_default().to_string(),
            lat: self.point.lat,
            lon: self.point.lon,
        })
    }
}

#[async_trait]
impl SecondarySource for PointsOfInterestSource {
    type Output = Vec<PointOfInterest>;

    fn kind(&self) -> SourceKind {
        SourceKind::PointsOfInterest
    }

    fn is_configured(&self) -> bool {
        self.enabled && self.api_key.is_some()
    }

    async fn try_fetch(
        &self,
        location: &ResolvedLocation,
    ) -> Result<Vec<PointOfInterest>, FetchError> {
        let key = self.api_key.as_deref().ok_or(FetchError::Unconfigured)?;
        let lat = location.lat.to_string();
        let lon = location.lon.to_string();
        let url = http::endpoint(
            &self.base_url,
            "places/radius",
            [
                ("radius", RADIUS_METERS),
                ("lon", lon.as_str()),
                ("lat", lat.as_str()),
                ("limit", LIMIT),
                ("format", "json"),
                ("apikey", key),
            ],
        )?;

        let places: Vec<Place> = http::get_json(self.client.get(url)).await?;
        Ok(places.into_iter().filter_map(Place::into_poi).collect())
    }
}
