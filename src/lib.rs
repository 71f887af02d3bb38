//! `WeatherIntel` - location-aware weather aggregation
//!
//! Resolves a free-text location, fetches a mandatory weather series with
//! provider fallback, enriches it with optional secondary sources that can
//! fail independently, and stores the assembled records behind a JSON API.

pub mod aggregator;
pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod location_resolver;
pub mod logging;
pub mod models;
pub mod sources;
pub mod store;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use aggregator::Aggregator;
pub use config::WeatherIntelConfig;
pub use error::{FetchError, WeatherIntelError};
pub use location_resolver::{LocationResolver, NominatimResolver};
pub use models::{
    AggregateRecord, DateRange, RecordUpdate, ResolvedLocation, SecondaryResult,
    SecondaryResults, WeatherSummary,
};
pub use sources::{SecondarySource, SecondarySources, fetch_guarded};
pub use store::{RecordFilter, RecordStore};
pub use weather::{PrimarySeriesFetcher, WeatherProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WeatherIntelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
