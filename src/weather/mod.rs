//! Primary weather series
//!
//! Providers are tried in order; the first one that returns a complete
//! [`WeatherSummary`] wins. Unconfigured providers are skipped, failures and
//! timeouts move on to the next provider, and only when every provider has
//! failed does the fetch fail as a whole. There is never a partial summary.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use crate::config::WeatherConfig;
use crate::error::FetchError;
use crate::http::HttpClient;
use crate::models::{DateRange, MAX_DAILY_ENTRIES, WeatherSummary};
use crate::{Result, WeatherIntelError};

pub mod open_meteo;
pub mod visual_crossing;

pub use open_meteo::OpenMeteoProvider;
pub use visual_crossing::VisualCrossingProvider;

/// One strategy in the provider chain
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Providers without their credential are skipped
    fn is_configured(&self) -> bool {
        true
    }

    /// Summary fields this provider cannot supply and fills with constants
    fn capability_gaps(&self) -> &'static [&'static str] {
        &[]
    }

    async fn fetch(
        &self,
        lat: f64,
        lon: f64,
        range: &DateRange,
    ) -> std::result::Result<WeatherSummary, FetchError>;
}

/// Ordered provider chain
pub struct PrimarySeriesFetcher {
    providers: Vec<Arc<dyn WeatherProvider>>,
    timeout: Duration,
}

impl PrimarySeriesFetcher {
    pub fn new(providers: Vec<Arc<dyn WeatherProvider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    /// Visual Crossing preferred, Open-Meteo as fallback
    pub fn from_config(client: HttpClient, config: &WeatherConfig, timeout: Duration) -> Self {
        Self::new(
            vec![
                Arc::new(VisualCrossingProvider::new(client.clone(), config)),
                Arc::new(OpenMeteoProvider::new(client, config)),
            ],
            timeout,
        )
    }

    #[must_use]
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Fetch the primary series, trying each configured provider in order
    #[instrument(skip(self, range), fields(start = %range.start, end = %range.end))]
    pub async fn fetch_primary_series(
        &self,
        lat: f64,
        lon: f64,
        range: &DateRange,
    ) -> Result<WeatherSummary> {
        let mut failures = Vec::new();

        for provider in &self.providers {
            let name = provider.name();

            if !provider.is_configured() {
                debug!("Skipping weather provider {}: not configured", name);
                failures.push(format!("{name}: {}", FetchError::Unconfigured));
                continue;
            }

            debug!("Requesting weather from {}", name);
            let outcome = tokio::time::timeout(self.timeout, provider.fetch(lat, lon, range))
                .await
                .unwrap_or(Err(FetchError::Timeout(self.timeout)));

            match outcome {
                Ok(mut summary) => {
                    summary.provider = name.to_string();
                    summary.daily_forecast.truncate(MAX_DAILY_ENTRIES);

                    let gaps = provider.capability_gaps();
                    if !gaps.is_empty() {
                        debug!("{} fills {:?} with constant defaults", name, gaps);
                    }
                    info!(
                        "Weather from {}: {} days, {}, wind {}",
                        name,
                        summary.daily_forecast.len(),
                        summary.format_temperature(),
                        summary.format_wind()
                    );
                    return Ok(summary);
                }
                Err(e) => {
                    warn!("Weather provider {} failed: {}", name, e);
                    failures.push(format!("{name}: {e}"));
                }
            }
        }

        if failures.is_empty() {
            return Err(WeatherIntelError::weather_fetch(
                "no weather providers registered",
            ));
        }
        Err(WeatherIntelError::weather_fetch(failures.join("; ")))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::models::DailyForecast;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Build a summary with `days` daily entries
    pub fn summary(provider: &str, days: usize) -> WeatherSummary {
        WeatherSummary {
            provider: provider.to_string(),
            temperature: 21.5,
            temp_min: 15.0,
            temp_max: 25.0,
            humidity: 55.0,
            wind_speed: 12.0,
            wind_direction: 250.0,
            conditions: "Partially cloudy".to_string(),
            description: "Partly cloudy throughout the day.".to_string(),
            precipitation: 0.4,
            cloud_cover: 40.0,
            uv_index: 6.0,
            visibility: 24.1,
            sunrise: "05:47:00".to_string(),
            sunset: "21:50:00".to_string(),
            daily_forecast: (0..days)
                .map(|day| DailyForecast {
                    date: format!("2024-06-{:02}", day + 1),
                    temp_max: 25.0,
                    temp_min: 15.0,
                    conditions: "Partially cloudy".to_string(),
                    precipitation: 0.0,
                })
                .collect(),
        }
    }

    pub enum Behaviour {
        Succeed(usize),
        Fail,
        Hang,
    }

    /// In-process provider that counts its calls
    pub struct FakeProvider {
        pub name: &'static str,
        pub configured: bool,
        pub behaviour: Behaviour,
        pub calls: AtomicUsize,
    }

    impl FakeProvider {
        fn build(name: &'static str, behaviour: Behaviour) -> Self {
            Self {
                name,
                configured: true,
                behaviour,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn new(name: &'static str, behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self::build(name, behaviour))
        }

        pub fn unconfigured(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                configured: false,
                ..Self::build(name, Behaviour::Fail)
            })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn fetch(
            &self,
            _lat: f64,
            _lon: f64,
            _range: &DateRange,
        ) -> std::result::Result<WeatherSummary, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Succeed(days) => Ok(summary(self.name, days)),
                Behaviour::Fail => Err(FetchError::Status {
                    status: 401,
                    body: "invalid key".to_string(),
                }),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err(FetchError::NoResults)
                }
            }
        }
    }
}
