//! Shared outbound HTTP client
//!
//! One connection pool is shared by every collaborator. Transient failures
//! (connect errors, 5xx, 429) are retried with exponential backoff before a
//! collaborator sees them.

use anyhow::{Context, Result};
use reqwest::Url;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::AggregatorConfig;
use crate::error::FetchError;

pub type HttpClient = ClientWithMiddleware;

/// Upstream error bodies are cut to this many characters before logging.
const MAX_ERROR_BODY: usize = 512;

/// Build the shared client from the aggregator settings
pub fn build_client(config: &AggregatorConfig) -> Result<HttpClient> {
    let client = reqwest::Client::builder()
        .timeout(config.collaborator_timeout())
        .user_agent(config.user_agent.clone())
        .build()
        .with_context(|| "Failed to create HTTP client")?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Join `path` onto `base` and append query parameters
pub fn endpoint<I, K, V>(base: &str, path: &str, params: I) -> Result<Url, FetchError>
where
    I: IntoIterator,
    I::Item: std::borrow::Borrow<(K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let raw = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse_with_params(&raw, params).map_err(|e| FetchError::InvalidUrl(format!("{raw}: {e}")))
}

/// Send a request and decode a JSON body, mapping non-2xx statuses to
/// [`FetchError::Status`].
pub async fn get_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, FetchError> {
    let response = request.send().await?;
    let status = response.status();
    debug!("HTTP response received: {}", status);

    if !status.is_success() {
        let body: String = response
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(MAX_ERROR_BODY)
            .collect();
        return Err(FetchError::Status {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| FetchError::Malformed(e.to_string()))
}

/// Client without retries, for tests against mock servers
#[cfg(test)]
pub(crate) fn test_client() -> HttpClient {
    build_client(&AggregatorConfig {
        max_retries: 0,
        ..Default::default()
    })
    .expect("test client")
}
