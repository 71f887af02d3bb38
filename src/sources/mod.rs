//! Secondary enrichment sources
//!
//! A secondary source may be unconfigured, slow, broken or empty without
//! affecting the request it enriches. [`fetch_guarded`] is the only way the
//! aggregator calls a source and it cannot fail: every failure mode collapses
//! to [`SecondaryResult::Empty`].

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{debug, error, instrument, warn};

use crate::config::SourcesConfig;
use crate::error::FetchError;
use crate::http::HttpClient;
use crate::models::{
    AirQuality, CityImage, NewsArticle, PointOfInterest, ResolvedLocation, SecondaryResult,
    SecondaryResults, Sentinel, SourceKind, Video,
};

pub mod air_quality;
pub mod news;
pub mod points_of_interest;
pub mod unsplash;
pub mod wikipedia;
pub mod youtube;

pub use air_quality::AirQualitySource;
pub use news::NewsSource;
pub use points_of_interest::PointsOfInterestSource;
pub use unsplash::UnsplashSource;
pub use wikipedia::WikipediaSource;
pub use youtube::YouTubeSource;

#[async_trait]
pub trait SecondarySource: Send + Sync {
    type Output: Sentinel + Send;

    fn kind(&self) -> SourceKind;

    /// Missing credential or switched off in configuration
    fn is_configured(&self) -> bool;

    async fn try_fetch(&self, location: &ResolvedLocation) -> Result<Self::Output, FetchError>;
}

/// Call a source under a timeout, absorbing every failure
#[instrument(skip(source, location, timeout), fields(source = %source.kind()))]
pub async fn fetch_guarded<S>(
    source: &S,
    location: &ResolvedLocation,
    timeout: Duration,
) -> SecondaryResult<S::Output>
where
    S: SecondarySource + ?Sized,
{
    if !source.is_configured() {
        debug!("Source not configured, skipping");
        return SecondaryResult::Empty;
    }

    let attempt = AssertUnwindSafe(source.try_fetch(location)).catch_unwind();
    match tokio::time::timeout(timeout, attempt).await {
        Ok(Ok(Ok(payload))) => {
            let result = SecondaryResult::from_value(payload);
            if result.is_empty() {
                debug!("Source returned nothing");
            }
            result
        }
        Ok(Ok(Err(e))) => {
            warn!("Source failed: {}", e);
            SecondaryResult::Empty
        }
        Ok(Err(panic)) => {
            error!("Source panicked: {}", panic_message(panic.as_ref()));
            SecondaryResult::Empty
        }
        Err(_) => {
            warn!("Source failed: {}", FetchError::Timeout(timeout));
            SecondaryResult::Empty
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

/// The six enrichment sources of a request
#[derive(Clone)]
pub struct SecondarySources {
    pub videos: Arc<dyn SecondarySource<Output = Vec<Video>>>,
    pub air_quality: Arc<dyn SecondarySource<Output = Option<AirQuality>>>,
    pub city_history: Arc<dyn SecondarySource<Output = String>>,
    pub news: Arc<dyn SecondarySource<Output = Vec<NewsArticle>>>,
    pub images: Arc<dyn SecondarySource<Output = Vec<CityImage>>>,
    pub points_of_interest: Arc<dyn SecondarySource<Output = Vec<PointOfInterest>>>,
}

impl SecondarySources {
    pub fn from_config(client: HttpClient, config: &SourcesConfig) -> Self {
        Self {
            videos: Arc::new(YouTubeSource::new(client.clone(), &config.youtube)),
            air_quality: Arc::new(AirQualitySource::new(client.clone(), &config.air_quality)),
            city_history: Arc::new(WikipediaSource::new(client.clone(), &config.wikipedia)),
            news: Arc::new(NewsSource::new(client.clone(), &config.news)),
            images: Arc::new(UnsplashSource::new(client.clone(), &config.unsplash)),
            points_of_interest: Arc::new(PointsOfInterestSource::new(
                client,
                &config.opentripmap,
            )),
        }
    }

    /// Sources that will actually be called
    #[must_use]
    pub fn configured(&self) -> Vec<SourceKind> {
        let flags = [
            self.videos.is_configured(),
            self.air_quality.is_configured(),
            self.city_history.is_configured(),
            self.news.is_configured(),
            self.images.is_configured(),
            self.points_of_interest.is_configured(),
        ];
        SourceKind::ALL
            .into_iter()
            .zip(flags)
            .filter_map(|(kind, configured)| configured.then_some(kind))
            .collect()
    }

    /// Fan out to all six sources at once and merge by source identity.
    /// Completion order does not affect the result.
    pub async fn fetch_all(&self, location: &ResolvedLocation, timeout: Duration) -> SecondaryResults {
        let (videos, air_quality, city_history, news, images, points_of_interest) = futures::join!(
            fetch_guarded(self.videos.as_ref(), location, timeout),
            fetch_guarded(self.air_quality.as_ref(), location, timeout),
            fetch_guarded(self.city_history.as_ref(), location, timeout),
            fetch_guarded(self.news.as_ref(), location, timeout),
            fetch_guarded(self.images.as_ref(), location, timeout),
            fetch_guarded(self.points_of_interest.as_ref(), location, timeout),
        );

        SecondaryResults {
            videos,
            air_quality,
            city_history,
            news,
            images,
            points_of_interest,
        }
    }
}
