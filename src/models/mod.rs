//! Data models for `WeatherIntel`
//!
//! This module contains the core domain models organized by concern:
//! - Location: resolved coordinates and the map view derived from them
//! - Date range: the validated request window
//! - Weather: the canonical primary series every provider normalizes into
//! - Sources: secondary payloads and the typed empty/available wrapper
//! - Record: the assembled weather request

pub mod date_range;
pub mod location;
pub mod record;
pub mod sources;
pub mod weather;

// Re-export all public types for convenient access
pub use date_range::{DateRange, parse_date};
pub use location::{MapData, MapMarker, ResolvedLocation};
pub use record::{AggregateRecord, RecordUpdate};
pub use sources::{
    AirQuality, CityImage, NewsArticle, PointOfInterest, SecondaryResult, SecondaryResults,
    Sentinel, SourceKind, Video,
};
pub use weather::{DailyForecast, MAX_DAILY_ENTRIES, WeatherSummary};
