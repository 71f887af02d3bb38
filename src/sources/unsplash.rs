//! Cityscape photos from Unsplash

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;

use super::SecondarySource;
use crate::config::SourceConfig;
use crate::error::FetchError;
use crate::http::{self, HttpClient};
use crate::models::{CityImage, ResolvedLocation, SourceKind};

const PER_PAGE: &str = "6";

pub struct UnsplashSource {
    client: HttpClient,
    access_key: Option<String>,
    base_url: String,
    enabled: bool,
}

impl UnsplashSource {
    pub fn new(client: HttpClient, config: &SourceConfig) -> Self {
        Self {
            client,
            access_key: config.key().map(str::to_string),
            base_url: config.base_url.clone(),
            enabled: config.enabled,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    urls: PhotoUrls,
    user: Photographer,
    description: Option<String>,
    alt_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: String,
}

#[derive(Debug, Deserialize)]
struct Photographer {
    name: String,
}

#[async_trait]
impl SecondarySource for UnsplashSource {
    type Output = Vec<CityImage>;

    fn kind(&self) -> SourceKind {
        SourceKind::Images
    }

    fn is_configured(&self) -> bool {
        self.enabled && self.access_key.is_some()
    }

    async fn try_fetch(&self, location: &ResolvedLocation) -> Result<Vec<CityImage>, FetchError> {
        let key = self.access_key.as_deref().ok_or(FetchError::Unconfigured)?;
        let query = format!("{} cityscape", location.city);
        let url = http::endpoint(
            &self.base_url,
            "search/photos",
            [
                ("query", query.as_str()),
                ("per_page", PER_PAGE),
                ("orientation", "landscape"),
            ],
        )?;

        let request = self
            .client
            .get(url)
            .header(AUTHORIZATION, format!("Client-ID {key}"));
        let response: SearchResponse = http::get_json(request).await?;

        Ok(response
            .results
            .into_iter()
            .map(|photo| CityImage {
                url: photo.urls.regular,
                photographer: photo.user.name,
                description: photo.description.or(photo.alt_description),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_search_sends_client_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/photos"))
            .and(query_param("query", "Oslo cityscape"))
            .and(query_param("orientation", "landscape"))
            .and(header("Authorization", "Client-ID unsplash-test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 1,
                "results": [{
                    "urls": { "regular": "https://images.unsplash.com/photo-1" },
                    "user": { "name": "Ola Nordmann" },
                    "description": null,
                    "alt_description": "harbour at dusk"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = UnsplashSource::new(
            http::test_client(),
            &SourceConfig {
                enabled: true,
                api_key: Some("unsplash-test-key".to_string()),
                base_url: server.uri(),
            },
        );
        let oslo = ResolvedLocation::new("Oslo", "Norway", 59.9139, 10.7522).unwrap();
        let images = source.try_fetch(&oslo).await.unwrap();

        assert_eq!(images.len(), 1);
        assert_eq!(images[0].photographer, "Ola Nordmann");
        assert_eq!(images[0].description.as_deref(), Some("harbour at dusk"));
    }
}
