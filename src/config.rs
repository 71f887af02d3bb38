//! Configuration management for `WeatherIntel`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings. Every external
//! collaborator gets its own section, so a missing credential simply leaves
//! that collaborator unconfigured.

use crate::WeatherIntelError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherIntelConfig {
    /// Weather provider chain configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Location resolver configuration
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    /// Secondary enrichment sources
    #[serde(default)]
    pub sources: SourcesConfig,
    /// Outbound request behaviour shared by all collaborators
    #[serde(default)]
    pub aggregator: AggregatorConfig,
    /// Record store configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Weather provider settings, in preference order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Visual Crossing API key. Without it the preferred provider is skipped.
    pub visual_crossing_api_key: Option<String>,
    #[serde(default = "default_visual_crossing_base_url")]
    pub visual_crossing_base_url: String,
    #[serde(default = "default_open_meteo_base_url")]
    pub open_meteo_base_url: String,
}

/// Geocoder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,
}

/// Settings for a single secondary source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Sources can be switched off even when they need no credential
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: String,
}

impl SourceConfig {
    fn new(base_url: &str) -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: base_url.to_string(),
        }
    }

    /// Blank keys never get here; `validate_api_keys` rejects them at load
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }
}

/// All secondary sources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_youtube")]
    pub youtube: SourceConfig,
    #[serde(default = "default_air_quality")]
    pub air_quality: SourceConfig,
    #[serde(default = "default_wikipedia")]
    pub wikipedia: SourceConfig,
    #[serde(default = "default_news")]
    pub news: SourceConfig,
    #[serde(default = "default_unsplash")]
    pub unsplash: SourceConfig,
    #[serde(default = "default_opentripmap")]
    pub opentripmap: SourceConfig,
}

/// Outbound request behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Deadline for each collaborator call, in seconds
    #[serde(default = "default_collaborator_timeout")]
    pub collaborator_timeout_seconds: u32,
    /// Maximum number of retries for transient HTTP failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl AggregatorConfig {
    #[must_use]
    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_secs(self.collaborator_timeout_seconds.into())
    }
}

/// Record store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory of the record database
    #[serde(default = "default_storage_path")]
    pub path: String,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Whole-request deadline in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u32,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_visual_crossing_base_url() -> String {
    "https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline"
        .to_string()
}

fn default_open_meteo_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_geocoding_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_youtube() -> SourceConfig {
    SourceConfig::new("https://www.googleapis.com/youtube/v3")
}

fn default_air_quality() -> SourceConfig {
    SourceConfig::new("https://air-quality-api.open-meteo.com/v1")
}

fn default_wikipedia() -> SourceConfig {
    SourceConfig::new("https://en.wikipedia.org/w")
}

fn default_news() -> SourceConfig {
    SourceConfig::new("https://newsapi.org/v2")
}

fn default_unsplash() -> SourceConfig {
    SourceConfig::new("https://api.unsplash.com")
}

fn default_opentripmap() -> SourceConfig {
    SourceConfig::new("https://api.opentripmap.com/0.1/en")
}

fn default_collaborator_timeout() -> u32 {
    10
}

fn default_max_retries() -> u32 {
    2
}

fn default_user_agent() -> String {
    format!("WeatherIntel/{}", crate::VERSION)
}

fn default_storage_path() -> String {
    dirs::data_local_dir()
        .map(|dir| dir.join("weatherintel").join("requests"))
        .unwrap_or_else(|| PathBuf::from("data/requests"))
        .to_string_lossy()
        .into_owned()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_request_timeout() -> u32 {
    60
}

fn default_body_limit() -> usize {
    64 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            visual_crossing_api_key: None,
            visual_crossing_base_url: default_visual_crossing_base_url(),
            open_meteo_base_url: default_open_meteo_base_url(),
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            youtube: default_youtube(),
            air_quality: default_air_quality(),
            wikipedia: default_wikipedia(),
            news: default_news(),
            unsplash: default_unsplash(),
            opentripmap: default_opentripmap(),
        }
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            collaborator_timeout_seconds: default_collaborator_timeout(),
            max_retries: default_max_retries(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for WeatherIntelConfig {
    fn default() -> Self {
        Self {
            weather: WeatherConfig::default(),
            geocoding: GeocodingConfig::default(),
            sources: SourcesConfig::default(),
            aggregator: AggregatorConfig::default(),
            storage: StorageConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl WeatherIntelConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // WEATHERINTEL_SOURCES__NEWS__API_KEY -> sources.news.api_key
        builder = builder.add_source(
            Environment::with_prefix("WEATHERINTEL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: WeatherIntelConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("weatherintel").join("config.toml"))
    }

    /// Apply default values to fields left blank in the file or environment
    pub fn apply_defaults(&mut self) {
        if self.weather.visual_crossing_base_url.is_empty() {
            self.weather.visual_crossing_base_url = default_visual_crossing_base_url();
        }
        if self.weather.open_meteo_base_url.is_empty() {
            self.weather.open_meteo_base_url = default_open_meteo_base_url();
        }
        if self.geocoding.base_url.is_empty() {
            self.geocoding.base_url = default_geocoding_base_url();
        }

        let sources = &mut self.sources;
        for (source, fallback) in [
            (&mut sources.youtube, default_youtube()),
            (&mut sources.air_quality, default_air_quality()),
            (&mut sources.wikipedia, default_wikipedia()),
            (&mut sources.news, default_news()),
            (&mut sources.unsplash, default_unsplash()),
            (&mut sources.opentripmap, default_opentripmap()),
        ] {
            if source.base_url.is_empty() {
                source.base_url = fallback.base_url;
            }
        }

        if self.aggregator.collaborator_timeout_seconds == 0 {
            self.aggregator.collaborator_timeout_seconds = default_collaborator_timeout();
        }
        if self.aggregator.user_agent.is_empty() {
            self.aggregator.user_agent = default_user_agent();
        }
        if self.storage.path.is_empty() {
            self.storage.path = default_storage_path();
        }
        if self.server.request_timeout_seconds == 0 {
            self.server.request_timeout_seconds = default_request_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials. Absent keys are fine; present
    /// keys must look plausible.
    pub fn validate_api_keys(&self) -> Result<()> {
        let keys = [
            ("weather.visual_crossing_api_key", &self.weather.visual_crossing_api_key),
            ("sources.youtube.api_key", &self.sources.youtube.api_key),
            ("sources.news.api_key", &self.sources.news.api_key),
            ("sources.unsplash.api_key", &self.sources.unsplash.api_key),
            ("sources.opentripmap.api_key", &self.sources.opentripmap.api_key),
        ];

        for (name, key) in keys {
            let Some(key) = key else { continue };

            if key.trim().is_empty() {
                return Err(WeatherIntelError::config(format!(
                    "{name} cannot be empty if provided. Either remove it or provide a valid key."
                ))
                .into());
            }

            if key.len() < 8 {
                return Err(WeatherIntelError::config(format!(
                    "{name} appears to be invalid (too short). Please check your API key."
                ))
                .into());
            }

            if key.len() > 200 {
                return Err(WeatherIntelError::config(format!(
                    "{name} appears to be invalid (too long). Please check your API key."
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.aggregator.collaborator_timeout_seconds > 300 {
            return Err(
                WeatherIntelError::config("Collaborator timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.aggregator.max_retries > 10 {
            return Err(WeatherIntelError::config("Max retries cannot exceed 10").into());
        }

        if self.server.port == 0 {
            return Err(WeatherIntelError::config("Server port cannot be 0").into());
        }

        if self.server.request_timeout_seconds > 600 {
            return Err(
                WeatherIntelError::config("Request timeout cannot exceed 600 seconds").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(WeatherIntelError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(WeatherIntelError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("weather.visual_crossing_base_url", &self.weather.visual_crossing_base_url),
            ("weather.open_meteo_base_url", &self.weather.open_meteo_base_url),
            ("geocoding.base_url", &self.geocoding.base_url),
            ("sources.youtube.base_url", &self.sources.youtube.base_url),
            ("sources.air_quality.base_url", &self.sources.air_quality.base_url),
            ("sources.wikipedia.base_url", &self.sources.wikipedia.base_url),
            ("sources.news.base_url", &self.sources.news.base_url),
            ("sources.unsplash.base_url", &self.sources.unsplash.base_url),
            ("sources.opentripmap.base_url", &self.sources.opentripmap.base_url),
        ];

        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(WeatherIntelError::config(format!(
                    "{name} must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = WeatherIntelConfig::default();
        assert_eq!(config.weather.open_meteo_base_url, "https://api.open-meteo.com/v1");
        assert!(config.weather.visual_crossing_api_key.is_none());
        assert_eq!(config.aggregator.collaborator_timeout_seconds, 10);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.server.port, 4000);
        assert!(config.sources.news.key().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_empty_api_key() {
        let mut config = WeatherIntelConfig::default();
        config.sources.news.api_key = Some("   ".to_string());
        let result = config.validate_api_keys();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("sources.news.api_key"));
    }

    #[test]
    fn test_config_validation_valid_api_key() {
        let mut config = WeatherIntelConfig::default();
        config.weather.visual_crossing_api_key = Some("valid_api_key_123".to_string());
        assert!(config.validate_api_keys().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = WeatherIntelConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = WeatherIntelConfig::default();
        config.aggregator.collaborator_timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));
    }

    #[test]
    fn test_config_validation_bad_url() {
        let mut config = WeatherIntelConfig::default();
        config.geocoding.base_url = "nominatim.local".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("geocoding.base_url"));
    }

    #[test]
    fn test_apply_defaults_fills_blank_source_urls() {
        let mut config = WeatherIntelConfig::default();
        config.sources.unsplash.base_url = String::new();
        config.aggregator.collaborator_timeout_seconds = 0;
        config.apply_defaults();
        assert_eq!(config.sources.unsplash.base_url, "https://api.unsplash.com");
        assert_eq!(config.aggregator.collaborator_timeout_seconds, 10);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[weather]
visual_crossing_api_key = "vc_test_key_123"

[sources.news]
api_key = "news_test_key_123"

[sources.wikipedia]
enabled = false

[logging]
level = "debug"
"#
        )
        .unwrap();

        let config = WeatherIntelConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(
            config.weather.visual_crossing_api_key.as_deref(),
            Some("vc_test_key_123")
        );
        assert_eq!(config.sources.news.key(), Some("news_test_key_123"));
        assert_eq!(config.sources.news.base_url, "https://newsapi.org/v2");
        assert!(!config.sources.wikipedia.enabled);
        assert!(config.sources.youtube.enabled);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = WeatherIntelConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("weatherintel"));
            assert!(path.to_string_lossy().ends_with("config.toml"));
        }
    }
}
