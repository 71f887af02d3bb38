//! Visual Crossing timeline provider

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::WeatherProvider;
use crate::config::WeatherConfig;
use crate::error::FetchError;
use crate::http::{self, HttpClient};
use crate::models::{DailyForecast, DateRange, MAX_DAILY_ENTRIES, WeatherSummary};

pub struct VisualCrossingProvider {
    client: HttpClient,
    api_key: Option<String>,
    base_url: String,
}

impl VisualCrossingProvider {
    pub fn new(client: HttpClient, config: &WeatherConfig) -> Self {
        Self {
            client,
            api_key: config.visual_crossing_api_key.clone(),
            base_url: config.visual_crossing_base_url.clone(),
        }
    }
}

#[async_trait]
impl WeatherProvider for VisualCrossingProvider {
    fn name(&self) -> &'static str {
        "visual_crossing"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    #[instrument(name = "visual_crossing", skip(self, range))]
    async fn fetch(
        &self,
        lat: f64,
        lon: f64,
        range: &DateRange,
    ) -> Result<WeatherSummary, FetchError> {
        let key = self.api_key.as_deref().ok_or(FetchError::Unconfigured)?;
        let path = format!("{lat},{lon}/{}/{}", range.start_str(), range.end_str());
        let url = http::endpoint(
            &self.base_url,
            &path,
            [
                ("unitGroup", "metric"),
                ("key", key),
                ("include", "days,current"),
            ],
        )?;

        debug!("Requesting Visual Crossing timeline");
        let timeline: vc::Timeline = http::get_json(self.client.get(url)).await?;
        timeline.into_summary()
    }
}

/// Visual Crossing response structures
mod vc {
    use super::*;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Timeline {
        #[serde(default)]
        pub days: Vec<Day>,
        pub current_conditions: Option<Conditions>,
    }

    /// Fields shared by current conditions and days
    #[derive(Debug, Clone, Deserialize)]
    pub struct Conditions {
        pub temp: Option<f64>,
        pub humidity: Option<f64>,
        pub windspeed: Option<f64>,
        pub winddir: Option<f64>,
        pub conditions: Option<String>,
        pub description: Option<String>,
        pub precip: Option<f64>,
        pub cloudcover: Option<f64>,
        pub uvindex: Option<f64>,
        pub visibility: Option<f64>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Day {
        pub datetime: String,
        pub tempmax: Option<f64>,
        pub tempmin: Option<f64>,
        pub sunrise: Option<String>,
        pub sunset: Option<String>,
        #[serde(flatten)]
        pub conditions: Conditions,
    }

    impl Timeline {
        pub fn into_summary(self) -> Result<WeatherSummary, FetchError> {
            let first = self.days.first().ok_or(FetchError::NoResults)?;
            // Current conditions are absent for historical ranges
            let current = self
                .current_conditions
                .clone()
                .unwrap_or_else(|| first.conditions.clone());

            let temperature = current
                .temp
                .ok_or_else(|| FetchError::Malformed("missing current temperature".to_string()))?;
            let conditions = current.conditions.clone().unwrap_or_default();

            Ok(WeatherSummary {
                provider: String::new(),
                temperature,
                temp_min: first.tempmin.unwrap_or(temperature),
                temp_max: first.tempmax.unwrap_or(temperature),
                humidity: current.humidity.unwrap_or_default(),
                wind_speed: current.windspeed.unwrap_or_default(),
                wind_direction: current.winddir.unwrap_or_default(),
                description: current
                    .description
                    .clone()
                    .filter(|d| !d.is_empty())
                    .unwrap_or_else(|| conditions.clone()),
                conditions,
                precipitation: current.precip.unwrap_or_default(),
                cloud_cover: current.cloudcover.unwrap_or_default(),
                uv_index: current.uvindex.unwrap_or_default(),
                visibility: current.visibility.unwrap_or_default(),
                sunrise: first.sunrise.clone().unwrap_or_default(),
                sunset: first.sunset.clone().unwrap_or_default(),
                daily_forecast: self
                    .days
                    .iter()
                    .take(MAX_DAILY_ENTRIES)
                    .map(|day| DailyForecast {
                        date: day.datetime.clone(),
                        temp_max: day.tempmax.unwrap_or_default(),
                        temp_min: day.tempmin.unwrap_or_default(),
                        conditions: day.conditions.conditions.clone().unwrap_or_default(),
                        precipitation: day.conditions.precip.unwrap_or_default(),
                    })
                    .collect(),
            })
        }
    }
}
