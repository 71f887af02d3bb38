//! Travel videos from the YouTube Data API

use async_trait::async_trait;
use serde::Deserialize;

use super::SecondarySource;
use crate::config::SourceConfig;
use crate::error::FetchError;
use crate::http::{self, HttpClient};
use crate::models::{ResolvedLocation, SourceKind, Video};

const MAX_RESULTS: &str = "6";

pub struct YouTubeSource {
    client: HttpClient,
    api_key: Option<String>,
    base_url: String,
    enabled: bool,
}

impl YouTubeSource {
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
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: ItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    channel_title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl SearchItem {
    fn into_video(self) -> Option<Video> {
        // Channel and playlist hits carry no video id
        let video_id = self.id.video_id?;
        let thumbnail = self
            .snippet
            .thumbnails
            .medium
            .or(self.snippet.thumbnails.default)
            .map(|t| t.url);
        Some(Video {
            title: self.snippet.title,
            video_id,
            thumbnail,
            channel: self.snippet.channel_title,
        })
    }
}

#[async_trait]
impl SecondarySource for YouTubeSource {
    type Output = Vec<Video>;

    fn kind(&self) -> SourceKind {
        SourceKind::Videos
    }

    fn is_configured(&self) -> bool {
        self.enabled && self.api_key.is_some()
    }

    async fn try_fetch(&self, location: &ResolvedLocation) -> Result<Vec<Video>, FetchError> {
        let key = self.api_key.as_deref().ok_or(FetchError::Unconfigured)?;
        let query = format!(
            "{} {} travel guide walking tour",
            location.city, location.country
        );
        let url = http::endpoint(
            &self.base_url,
            "search",
            [
                ("part", "snippet"),
                ("q", query.as_str()),
                ("type", "video"),
                ("maxResults", MAX_RESULTS),
                ("key", key),
                ("order", "relevance"),
                ("videoDuration", "medium"),
                ("videoEmbeddable", "true"),
            ],
        )?;

        let response: SearchResponse = http::get_json(self.client.get(url)).await?;
        Ok(response
            .items
            .into_iter()
            .filter_map(SearchItem::into_video)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(server: &MockServer, key: Option<&str>) -> YouTubeSource {
        YouTubeSource::new(
            http::test_client(),
            &SourceConfig {
                enabled: true,
                api_key: key.map(str::to_string),
                base_url: server.uri(),
            },
        )
    }

    fn lisbon() -> ResolvedLocation {
        ResolvedLocation::new("Lisbon", "Portugal", 38.7223, -9.1393).unwrap()
    }

    #[tokio::test]
    async fn test_search_maps_videos() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "Lisbon Portugal travel guide walking tour"))
            .and(query_param("type", "video"))
            .and(query_param("maxResults", "6"))
            .and(query_param("key", "yt-test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {
                        "id": { "kind": "youtube#video", "videoId": "dQw4w9WgXcQ" },
                        "snippet": {
                            "title": "Lisbon Walking Tour 4K",
                            "channelTitle": "City Walks",
                            "thumbnails": {
                                "default": { "url": "https://i.ytimg.com/vi/x/default.jpg" },
                                "medium": { "url": "https://i.ytimg.com/vi/x/mqdefault.jpg" }
                            }
                        }
                    },
                    {
                        "id": { "kind": "youtube#channel", "channelId": "UC123" },
                        "snippet": { "title": "A channel", "channelTitle": "A channel" }
                    }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let videos = source(&server, Some("yt-test-key"))
            .try_fetch(&lisbon())
            .await
            .unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].video_id, "dQw4w9WgXcQ");
        assert_eq!(
            videos[0].thumbnail.as_deref(),
            Some("https://i.ytimg.com/vi/x/mqdefault.jpg")
        );
        assert_eq!(videos[0].channel, "City Walks");
    }

    #[tokio::test]
    async fn test_without_key_is_unconfigured() {
        let server = MockServer::start().await;
        let source = source(&server, None);
        assert!(!source.is_configured());
        assert!(matches!(
            source.try_fetch(&lisbon()).await,
            Err(FetchError::Unconfigured)
        ));
    }

    #[tokio::test]
    async fn test_quota_exceeded_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("quotaExceeded"))
            .mount(&server)
            .await;

        let err = source(&server, Some("yt-test-key"))
            .try_fetch(&lisbon())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 403, .. }));
    }
}
