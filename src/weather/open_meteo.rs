//! Open-Meteo forecast provider
//!
//! Needs no credential, but the free forecast endpoint has no humidity,
//! cloud cover, UV index, visibility, sun times or daily conditions in the
//! requested variable set. Those fields are filled with the constants below
//! and listed in [`CAPABILITY_GAPS`].

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::WeatherProvider;
use crate::config::WeatherConfig;
use crate::error::FetchError;
use crate::http::{self, HttpClient};
use crate::models::{DailyForecast, DateRange, MAX_DAILY_ENTRIES, WeatherSummary};

pub const DEFAULT_HUMIDITY: f64 = 65.0;
pub const DEFAULT_CLOUD_COVER: f64 = 0.0;
pub const DEFAULT_UV_INDEX: f64 = 0.0;
pub const DEFAULT_VISIBILITY: f64 = 10.0;
pub const DEFAULT_SUNRISE: &str = "06:00";
pub const DEFAULT_SUNSET: &str = "18:00";
pub const DEFAULT_DAILY_CONDITIONS: &str = "Clear";

pub const CAPABILITY_GAPS: &[&str] = &[
    "humidity",
    "cloud_cover",
    "uv_index",
    "visibility",
    "sunrise",
    "sunset",
    "daily_forecast.conditions",
];

const DAILY_VARIABLES: &str = "temperature_2m_max,temperature_2m_min,precipitation_sum,windspeed_10m_max";

pub struct OpenMeteoProvider {
    client: HttpClient,
    base_url: String,
}

impl OpenMeteoProvider {
    pub fn new(client: HttpClient, config: &WeatherConfig) -> Self {
        Self {
            client,
            base_url: config.open_meteo_base_url.clone(),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    fn name(&self) -> &'static str {
        "open_meteo"
    }

    fn capability_gaps(&self) -> &'static [&'static str] {
        CAPABILITY_GAPS
    }

    #[instrument(name = "open_meteo", skip(self, range))]
    async fn fetch(
        &self,
        lat: f64,
        lon: f64,
        range: &DateRange,
    ) -> Result<WeatherSummary, FetchError> {
        let lat = lat.to_string();
        let lon = lon.to_string();
        let start = range.start_str();
        let end = range.end_str();
        let url = http::endpoint(
            &self.base_url,
            "forecast",
            [
                ("latitude", lat.as_str()),
                ("longitude", lon.as_str()),
                ("start_date", start.as_str()),
                ("end_date", end.as_str()),
                ("daily", DAILY_VARIABLES),
                ("current_weather", "true"),
                ("timezone", "auto"),
            ],
        )?;

        debug!("Requesting Open-Meteo forecast");
        let forecast: ForecastResponse = http::get_json(self.client.get(url)).await?;
        forecast.into_summary()
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: Option<CurrentWeather>,
    daily: Option<DailyData>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature: f64,
    windspeed: f64,
    winddirection: f64,
    weathercode: u8,
}

#[derive(Debug, Deserialize)]
struct DailyData {
    time: Vec<String>,
    #[serde(rename = "temperature_2m_max")]
    temperature_max: Vec<Option<f64>>,
    #[serde(rename = "temperature_2m_min")]
    temperature_min: Vec<Option<f64>>,
    precipitation_sum: Vec<Option<f64>>,
}

impl ForecastResponse {
    fn into_summary(self) -> Result<WeatherSummary, FetchError> {
        let current = self
            .current_weather
            .ok_or_else(|| FetchError::Malformed("missing current_weather".to_string()))?;
        let daily = self
            .daily
            .ok_or_else(|| FetchError::Malformed("missing daily block".to_string()))?;
        if daily.time.is_empty() {
            return Err(FetchError::NoResults);
        }

        let value_at = |values: &[Option<f64>], idx: usize| -> f64 {
            values.get(idx).copied().flatten().unwrap_or_default()
        };
        let label = weather_code_to_description(current.weathercode).to_string();

        Ok(WeatherSummary {
            provider: String::new(),
            temperature: current.temperature,
            temp_min: value_at(&daily.temperature_min, 0),
            temp_max: value_at(&daily.temperature_max, 0),
            humidity: DEFAULT_HUMIDITY,
            wind_speed: current.windspeed,
            wind_direction: current.winddirection,
            conditions: label.clone(),
            description: label,
            precipitation: value_at(&daily.precipitation_sum, 0),
            cloud_cover: DEFAULT_CLOUD_COVER,
            uv_index: DEFAULT_UV_INDEX,
            visibility: DEFAULT_VISIBILITY,
            sunrise: DEFAULT_SUNRISE.to_string(),
            sunset: DEFAULT_SUNSET.to_string(),
            daily_forecast: daily
                .time
                .iter()
                .take(MAX_DAILY_ENTRIES)
                .enumerate()
                .map(|(idx, date)| DailyForecast {
                    date: date.clone(),
                    temp_max: value_at(&daily.temperature_max, idx),
                    temp_min: value_at(&daily.temperature_min, idx),
                    conditions: DEFAULT_DAILY_CONDITIONS.to_string(),
                    precipitation: value_at(&daily.precipitation_sum, idx),
                })
                .collect(),
        })
    }
}

/// Convert a WMO weather code to a human-readable description
#[must_use]
pub fn weather_code_to_description(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}
