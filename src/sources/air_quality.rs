//! Air quality from the Open-Meteo air-quality API
//!
//! The index reported is the US EPA AQI computed from PM2.5 alone.

use async_trait::async_trait;
use serde::Deserialize;

use super::SecondarySource;
use crate::config::SourceConfig;
use crate::error::FetchError;
use crate::http::{self, HttpClient};
use crate::models::{AirQuality, ResolvedLocation, SourceKind};

const CURRENT_VARIABLES: &str =
    "pm10,pm2_5,ozone,nitrogen_dioxide,sulphur_dioxide,carbon_monoxide";

/// (concentration low, concentration high, index low, index high)
const PM25_BREAKPOINTS: [(f64, f64, f64, f64); 6] = [
    (0.0, 12.0, 0.0, 50.0),
    (12.1, 35.4, 51.0, 100.0),
    (35.5, 55.4, 101.0, 150.0),
    (55.5, 150.4, 151.0, 200.0),
    (150.5, 250.4, 201.0, 300.0),
    (250.5, 500.4, 301.0, 500.0),
];

pub struct AirQualitySource {
    client: HttpClient,
    base_url: String,
    enabled: bool,
}

impl AirQualitySource {
    pub fn new(client: HttpClient, config: &SourceConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            enabled: config.enabled,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AirQualityResponse {
    current: Option<CurrentValues>,
}

#[derive(Debug, Deserialize)]
struct CurrentValues {
    pm2_5: Option<f64>,
    pm10: Option<f64>,
    ozone: Option<f64>,
    nitrogen_dioxide: Option<f64>,
    sulphur_dioxide: Option<f64>,
    carbon_monoxide: Option<f64>,
}

/// US EPA AQI for a PM2.5 concentration in μg/m³
#[must_use]
pub fn pm25_to_aqi(pm25: f64) -> u32 {
    let pm25 = pm25.max(0.0);
    let (c_lo, c_hi, i_lo, i_hi) = PM25_BREAKPOINTS
        .iter()
        .copied()
        .find(|(_, c_hi, _, _)| pm25 <= *c_hi)
        .unwrap_or(PM25_BREAKPOINTS[PM25_BREAKPOINTS.len() - 1]);

    let index = if c_lo == 0.0 {
        i_hi / c_hi * pm25
    } else {
        (i_hi - i_lo) / (c_hi - c_lo) * (pm25 - c_lo) + i_lo
    };
    index.round().max(0.0) as u32
}

#[must_use]
pub fn quality_level(aqi: u32) -> &'static str {
    match aqi {
        0..=50 => "Good",
        51..=100 => "Moderate",
        101..=150 => "Unhealthy for Sensitive Groups",
        151..=200 => "Unhealthy",
        201..=300 => "Very Unhealthy",
        _ => "Hazardous",
    }
}

#[async_trait]
impl SecondarySource for AirQualitySource {
    type Output = Option<AirQuality>;

    fn kind(&self) -> SourceKind {
        SourceKind::AirQuality
    }

    fn is_configured(&self) -> bool {
        self.enabled
    }

    async fn try_fetch(
        &self,
        location: &ResolvedLocation,
    ) -> Result<Option<AirQuality>, FetchError> {
        let lat = location.lat.to_string();
        let lon = location.lon.to_string();
        let url = http::endpoint(
            &self.base_url,
            "air-quality",
            [
                ("latitude", lat.as_str()),
                ("longitude", lon.as_str()),
                ("current", CURRENT_VARIABLES),
            ],
        )?;

        let response: AirQualityResponse = http::get_json(self.client.get(url)).await?;
        let Some(current) = response.current else {
            return Ok(None);
        };
        // Without PM2.5 there is no index to report
        let Some(pm25) = current.pm2_5 else {
            return Ok(None);
        };

        let aqi = pm25_to_aqi(pm25);
        Ok(Some(AirQuality {
            aqi,
            pm25,
            pm10: current.pm10.unwrap_or_default(),
            o3: current.ozone.unwrap_or_default(),
            no2: current.nitrogen_dioxide.unwrap_or_default(),
            so2: current.sulphur_dioxide.unwrap_or_default(),
            co: current.carbon_monoxide.unwrap_or_default(),
            quality_level: quality_level(aqi).to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(server: &MockServer) -> AirQualitySource {
        AirQualitySource::new(
            http::test_client(),
            &SourceConfig {
                enabled: true,
                api_key: None,
                base_url: server.uri(),
            },
        )
    }

    fn delhi() -> ResolvedLocation {
        ResolvedLocation::new("New Delhi", "India", 28.6139, 77.209).unwrap()
    }

    #[rstest]
    #[case(0.0, 0)]
    #[case(6.0, 25)]
    #[case(12.0, 50)]
    #[case(35.4, 100)]
    #[case(55.4, 150)]
    #[case(150.4, 200)]
    #[case(250.4, 300)]
    #[case(500.4, 500)]
    fn test_pm25_to_aqi(#[case] pm25: f64, #[case] expected: u32) {
        assert_eq!(pm25_to_aqi(pm25), expected);
    }

    #[rstest]
    #[case(50, "Good")]
    #[case(51, "Moderate")]
    #[case(120, "Unhealthy for Sensitive Groups")]
    #[case(180, "Unhealthy")]
    #[case(300, "Very Unhealthy")]
    #[case(301, "Hazardous")]
    fn test_quality_level(#[case] aqi: u32, #[case] expected: &str) {
        assert_eq!(quality_level(aqi), expected);
    }

    #[tokio::test]
    async fn test_fetch_computes_index() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/air-quality"))
            .and(query_param("current", CURRENT_VARIABLES))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "current": {
                    "time": "2024-06-01T12:00",
                    "pm10": 140.2,
                    "pm2_5": 88.0,
                    "ozone": 61.0,
                    "nitrogen_dioxide": 45.3,
                    "sulphur_dioxide": 12.0,
                    "carbon_monoxide": 900.0
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reading = source(&server).try_fetch(&delhi()).await.unwrap().unwrap();
        assert_eq!(reading.aqi, 168);
        assert_eq!(reading.quality_level, "Unhealthy");
        assert_eq!(reading.pm10, 140.2);
    }

    #[tokio::test]
    async fn test_missing_pm25_is_no_reading() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "current": { "pm10": null, "pm2_5": null }
            })))
            .mount(&server)
            .await;

        assert_eq!(source(&server).try_fetch(&delhi()).await.unwrap(), None);
    }
}
