//! City history from the Wikipedia intro extract

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::SecondarySource;
use crate::config::SourceConfig;
use crate::error::FetchError;
use crate::http::{self, HttpClient};
use crate::models::{ResolvedLocation, SourceKind};

pub struct WikipediaSource {
    client: HttpClient,
    base_url: String,
    enabled: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: SearchQuery,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    pageid: u64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    query: ExtractQuery,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: HashMap<String, Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    extract: Option<String>,
}

impl WikipediaSource {
    pub fn new(client: HttpClient, config: &SourceConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            enabled: config.enabled,
        }
    }

    async fn search(&self, term: &str) -> Result<Option<SearchHit>, FetchError> {
        let url = http::endpoint(
            &self.base_url,
            "api.php",
            [
                ("action", "query"),
                ("list", "search"),
                ("srsearch", term),
                ("format", "json"),
            ],
        )?;
        let response: SearchResponse = http::get_json(self.client.get(url)).await?;
        Ok(response.query.search.into_iter().next())
    }

    async fn extract(&self, pageid: u64) -> Result<String, FetchError> {
        let pageid = pageid.to_string();
        let url = http::endpoint(
            &self.base_url,
            "api.php",
            [
                ("action", "query"),
                ("prop", "extracts"),
                ("pageids", pageid.as_str()),
                ("exintro", "true"),
                ("explaintext", "true"),
                ("format", "json"),
            ],
        )?;
        let mut response: ExtractResponse = http::get_json(self.client.get(url)).await?;
        Ok(response
            .query
            .pages
            .remove(&pageid)
            .and_then(|page| page.extract)
            .map(|text| text.trim().to_string())
            .unwrap_or_default())
    }
}

#[async_trait]
impl SecondarySource for WikipediaSource {
    type Output = String;

    fn kind(&self) -> SourceKind {
        SourceKind::CityHistory
    }

    fn is_configured(&self) -> bool {
        self.enabled
    }

    async fn try_fetch(&self, location: &ResolvedLocation) -> Result<String, FetchError> {
        let Some(hit) = self.search(&location.city).await? else {
            return Ok(String::new());
        };
        debug!("Wikipedia article for {}: {}", location.city, hit.title);
        self.extract(hit.pageid).await
    }
}
