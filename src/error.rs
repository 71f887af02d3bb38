//! Error types and handling for `WeatherIntel`

use std::time::Duration;

use thiserror::Error;

/// Main error type for the `WeatherIntel` service
#[derive(Error, Debug)]
pub enum WeatherIntelError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Malformed input, detected before any I/O
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// The location query could not be turned into coordinates
    #[error("Unable to resolve location: {message}")]
    Resolution { message: String },

    /// No weather provider could supply the primary series
    #[error("Weather data unavailable: {message}")]
    WeatherFetch { message: String },

    /// A stored record does not exist
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Record store errors
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl WeatherIntelError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new resolution error
    pub fn resolution<S: Into<String>>(message: S) -> Self {
        Self::Resolution {
            message: message.into(),
        }
    }

    /// Create a new weather fetch error
    pub fn weather_fetch<S: Into<String>>(message: S) -> Self {
        Self::WeatherFetch {
            message: message.into(),
        }
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Short machine-readable tag, used in API error bodies
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            WeatherIntelError::Config { .. } => "config",
            WeatherIntelError::Validation { .. } => "validation",
            WeatherIntelError::Resolution { .. } => "resolution",
            WeatherIntelError::WeatherFetch { .. } => "weather_fetch",
            WeatherIntelError::NotFound { .. } => "not_found",
            WeatherIntelError::Storage { .. } => "storage",
            WeatherIntelError::Io { .. } => "io",
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            WeatherIntelError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            WeatherIntelError::Validation { message } => format!("Invalid input: {message}"),
            WeatherIntelError::Resolution { .. } => {
                "Unable to find that location. Try a more specific query.".to_string()
            }
            WeatherIntelError::WeatherFetch { .. } => {
                "Weather data is currently unavailable. Please try again later.".to_string()
            }
            WeatherIntelError::NotFound { message } => message.clone(),
            WeatherIntelError::Storage { .. } => {
                "Storage operation failed. Please try again later.".to_string()
            }
            WeatherIntelError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

/// Failure of a single upstream call made by a collaborator.
///
/// Fatal collaborators (resolver, weather providers) lift this into a
/// [`WeatherIntelError`]; secondary sources turn it into an empty result.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("not configured")]
    Unconfigured,

    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("no results")]
    NoResults,

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Malformed(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<reqwest_middleware::Error> for FetchError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(err) => err.into(),
            reqwest_middleware::Error::Middleware(err) => FetchError::Network(err.to_string()),
        }
    }
}
