// src/error.rs

//! Unified error handling for the crawler application.

use std::fmt;

use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization failed
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Root listing failed; the crawl cannot start
    #[error("Goal listing error: {0}")]
    Listing(String),

    /// A single goal's detail fetch failed
    #[error("Fetch error for {key}: {message}")]
    Fetch { key: String, message: String },

    /// The remote rejected a detail fetch as unauthorized
    #[error("Unauthorized fetching {key}")]
    Unauthorized { key: String },

    /// Consecutive unauthorized fetches; credentials likely expired
    #[error("Aborted after {consecutive} consecutive unauthorized fetches")]
    AuthExpired { consecutive: usize },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a listing error.
    pub fn listing(message: impl fmt::Display) -> Self {
        Self::Listing(message.to_string())
    }

    /// Create a node fetch error with context.
    pub fn fetch(key: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            key: key.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error is the unauthorized kind of fetch failure.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}
