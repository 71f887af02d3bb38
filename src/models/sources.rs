//! Secondary source payloads and the typed available/empty wrapper
//!
//! Every secondary source declares an empty sentinel for its payload type.
//! [`SecondaryResult`] carries either a non-sentinel payload or `Empty`, and
//! serializes `Empty` as the sentinel itself, so stored records read
//! `"news": []` or `"air_quality": null` rather than an error marker.

use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A payload type with a documented "nothing available" value
pub trait Sentinel {
    fn sentinel() -> Self;
    fn is_sentinel(&self) -> bool;
}

impl<T> Sentinel for Vec<T> {
    fn sentinel() -> Self {
        Vec::new()
    }

    fn is_sentinel(&self) -> bool {
        self.is_empty()
    }
}

impl<T> Sentinel for Option<T> {
    fn sentinel() -> Self {
        None
    }

    fn is_sentinel(&self) -> bool {
        self.is_none()
    }
}

impl Sentinel for String {
    fn sentinel() -> Self {
        String::new()
    }

    fn is_sentinel(&self) -> bool {
        self.trim().is_empty()
    }
}

/// Outcome of one secondary fetch
#[derive(Debug, Clone, PartialEq)]
pub enum SecondaryResult<T> {
    /// A non-sentinel payload
    Available(T),
    /// Source unconfigured, failed, timed out, or had nothing to return
    Empty,
}

impl<T> Default for SecondaryResult<T> {
    fn default() -> Self {
        SecondaryResult::Empty
    }
}

impl<T: Sentinel> SecondaryResult<T> {
    /// Wrap a payload, collapsing sentinel values to `Empty`
    pub fn from_value(value: T) -> Self {
        if value.is_sentinel() {
            SecondaryResult::Empty
        } else {
            SecondaryResult::Available(value)
        }
    }

    /// The payload, or the sentinel when empty
    pub fn into_value(self) -> T {
        match self {
            SecondaryResult::Available(value) => value,
            SecondaryResult::Empty => T::sentinel(),
        }
    }
}

impl<T> SecondaryResult<T> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, SecondaryResult::Empty)
    }

    #[must_use]
    pub fn available(&self) -> Option<&T> {
        match self {
            SecondaryResult::Available(value) => Some(value),
            SecondaryResult::Empty => None,
        }
    }
}

impl<T: Sentinel + Serialize> Serialize for SecondaryResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SecondaryResult::Available(value) => value.serialize(serializer),
            SecondaryResult::Empty => T::sentinel().serialize(serializer),
        }
    }
}

impl<'de, T: Sentinel + Deserialize<'de>> Deserialize<'de> for SecondaryResult<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(SecondaryResult::from_value)
    }
}

/// Identity of a secondary source. The order of [`SourceKind::ALL`] is the
/// order of the fields in [`SecondaryResults`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Videos,
    AirQuality,
    CityHistory,
    News,
    Images,
    PointsOfInterest,
}

impl SourceKind {
    pub const ALL: [SourceKind; 6] = [
        SourceKind::Videos,
        SourceKind::AirQuality,
        SourceKind::CityHistory,
        SourceKind::News,
        SourceKind::Images,
        SourceKind::PointsOfInterest,
    ];

    /// Field name of this source in a serialized record
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Videos => "videos",
            SourceKind::AirQuality => "air_quality",
            SourceKind::CityHistory => "city_history",
            SourceKind::News => "news",
            SourceKind::Images => "images",
            SourceKind::PointsOfInterest => "points_of_interest",
        }
    }
}

impl Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Travel video from a video search
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Video {
    pub title: String,
    pub video_id: String,
    pub thumbnail: Option<String>,
    pub channel: String,
}

/// Air quality estimate at the resolved coordinates
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AirQuality {
    /// US EPA air quality index derived from PM2.5
    pub aqi: u32,
    /// Concentrations in μg/m³
    pub pm25: f64,
    pub pm10: f64,
    pub o3: f64,
    pub no2: f64,
    pub so2: f64,
    pub co: f64,
    /// "Good", "Moderate", ... "Hazardous"
    pub quality_level: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NewsArticle {
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub source: String,
    pub published_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CityImage {
    pub url: String,
    pub photographer: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PointOfInterest {
    pub name: String,
    /// Primary category, e.g. "museums"
    pub kind: String,
    pub lat: f64,
    pub lon: f64,
}

/// Merged secondary results, one field per [`SourceKind`] in fixed order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecondaryResults {
    pub videos: SecondaryResult<Vec<Video>>,
    pub air_quality: SecondaryResult<Option<AirQuality>>,
    pub city_history: SecondaryResult<String>,
    pub news: SecondaryResult<Vec<NewsArticle>>,
    pub images: SecondaryResult<Vec<CityImage>>,
    pub points_of_interest: SecondaryResult<Vec<PointOfInterest>>,
}

impl SecondaryResults {
    #[must_use]
    pub fn is_available(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::Videos => !self.videos.is_empty(),
            SourceKind::AirQuality => !self.air_quality.is_empty(),
            SourceKind::CityHistory => !self.city_history.is_empty(),
            SourceKind::News => !self.news.is_empty(),
            SourceKind::Images => !self.images.is_empty(),
            SourceKind::PointsOfInterest => !self.points_of_interest.is_empty(),
        }
    }

    /// Sources holding their empty sentinel, in field order
    #[must_use]
    pub fn empty_sources(&self) -> Vec<SourceKind> {
        SourceKind::ALL
            .into_iter()
            .filter(|kind| !self.is_available(*kind))
            .collect()
    }
}
