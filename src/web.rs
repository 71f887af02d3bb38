use std::time::Duration;

use anyhow::{Context, Result};
use axum::{Router, http::StatusCode};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::api::{self, AppState};
use crate::config::ServerConfig;

/// Full application router, API mounted under `/api`
pub fn app(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .nest("/api", api::router(state))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            Duration::from_secs(u64::from(config.request_timeout_seconds)),
        ))
        .layer(RequestBodyLimitLayer::new(config.body_limit_bytes))
}

pub async fn run(state: AppState, config: &ServerConfig) -> Result<()> {
    let app = app(state, config);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://{}", addr);
    axum::serve(listener, app)
        .await
        .with_context(|| "Web server terminated")?;
    Ok(())
}
