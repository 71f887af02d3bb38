//! Local weather and climate headlines from NewsAPI

use async_trait::async_trait;
use serde::Deserialize;

use super::SecondarySource;
use crate::config::SourceConfig;
use crate::error::FetchError;
use crate::http::{self, HttpClient};
use crate::models::{NewsArticle, ResolvedLocation, SourceKind};

const PAGE_SIZE: &str = "5";
/// NewsAPI keeps takedowns in results with every text field set to this
const REMOVED_MARKER: &str = "[Removed]";

pub struct NewsSource {
    client: HttpClient,
    api_key: Option<String>,
    base_url: String,
    enabled: bool,
}

impl NewsSource {
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
struct EverythingResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    title: Option<String>,
    description: Option<String>,
    url: String,
    source: ArticleSource,
    #[serde(default)]
    published_at: String,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

#[async_trait]
impl SecondarySource for NewsSource {
    type Output = Vec<NewsArticle>;

    fn kind(&self) -> SourceKind {
        SourceKind::News
    }

    fn is_configured(&self) -> bool {
        self.enabled && self.api_key.is_some()
    }

    async fn try_fetch(&self, location: &ResolvedLocation) -> Result<Vec<NewsArticle>, FetchError> {
        let key = self.api_key.as_deref().ok_or(FetchError::Unconfigured)?;
        let query = format!("{0} weather OR {0} climate", location.city);
        let url = http::endpoint(
            &self.base_url,
            "everything",
            [
                ("q", query.as_str()),
                ("language", "en"),
                ("sortBy", "publishedAt"),
                ("pageSize", PAGE_SIZE),
                ("apiKey", key),
            ],
        )?;

        let response: EverythingResponse = http::get_json(self.client.get(url)).await?;
        Ok(response
            .articles
            .into_iter()
            .filter_map(|article| {
                let title = article.title.filter(|t| t.trim() != REMOVED_MARKER)?;
                Some(NewsArticle {
                    title,
                    description: article.description,
                    url: article.url,
                    source: article.source.name.unwrap_or_default(),
                    published_at: article.published_at,
                })
            })
            .collect())
    }
}
