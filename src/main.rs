use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use weatherintel::api::AppState;
use weatherintel::{Aggregator, RecordStore, WeatherIntelConfig, http, logging, web};

/// Config file from the first argument, then `WEATHERINTEL_CONFIG`, then the
/// platform config directory.
fn config_path() -> Option<PathBuf> {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var("WEATHERINTEL_CONFIG").ok())
        .map(PathBuf::from)
        .or_else(WeatherIntelConfig::get_config_path)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = WeatherIntelConfig::load_from_path(config_path())
        .with_context(|| "Failed to load configuration")?;
    logging::init(&config.logging)?;
    info!("Starting WeatherIntel {}", weatherintel::VERSION);

    let store = RecordStore::open(&config.storage.path)
        .with_context(|| format!("Failed to open record store at {}", config.storage.path))?;
    let client = http::build_client(&config.aggregator)?;
    let aggregator = Aggregator::from_config(client, &config);

    let state = AppState {
        aggregator: Arc::new(aggregator),
        store: Arc::new(store),
    };
    web::run(state, &config.server).await
}
