//! Canonical weather summary every provider normalizes into

use serde::{Deserialize, Serialize};

/// Upper bound on the number of daily entries kept in a summary
pub const MAX_DAILY_ENTRIES: usize = 10;

/// Primary weather series of a request
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSummary {
    /// Name of the provider that produced this summary
    pub provider: String,
    /// Current temperature in Celsius
    pub temperature: f64,
    /// Minimum temperature of the first day
    pub temp_min: f64,
    /// Maximum temperature of the first day
    pub temp_max: f64,
    /// Relative humidity percentage
    pub humidity: f64,
    /// Wind speed in km/h
    pub wind_speed: f64,
    /// Wind direction in degrees (0-360, where 0/360 is North)
    pub wind_direction: f64,
    /// Short condition label, e.g. "Partly cloudy"
    pub conditions: String,
    /// Longer human-readable description
    pub description: String,
    /// Precipitation amount in mm
    pub precipitation: f64,
    /// Cloud cover percentage (0-100)
    pub cloud_cover: f64,
    pub uv_index: f64,
    /// Visibility in kilometers
    pub visibility: f64,
    /// Local sunrise time, `HH:MM` or `HH:MM:SS`
    pub sunrise: String,
    /// Local sunset time, `HH:MM` or `HH:MM:SS`
    pub sunset: String,
    /// Day-by-day entries, in date order, at most [`MAX_DAILY_ENTRIES`]
    pub daily_forecast: Vec<DailyForecast>,
}

/// One day of the primary series
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailyForecast {
    /// `YYYY-MM-DD`
    pub date: String,
    pub temp_max: f64,
    pub temp_min: f64,
    pub conditions: String,
    pub precipitation: f64,
}

impl WeatherSummary {
    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C", self.temperature)
    }

    /// Format wind information
    #[must_use]
    pub fn format_wind(&self) -> String {
        format!(
            "{:.1} km/h {}",
            self.wind_speed,
            wind_direction_to_cardinal(self.wind_direction)
        )
    }
}

/// Convert wind direction from degrees to cardinal direction
#[must_use]
pub fn wind_direction_to_cardinal(degrees: f64) -> &'static str {
    if !degrees.is_finite() {
        return "Unknown";
    }
    const POINTS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
        "NW", "NNW",
    ];
    let normalized = degrees.rem_euclid(360.0);
    let index = ((normalized / 22.5).round() as usize) % POINTS.len();
    POINTS[index]
}
