//! Error types for stacklens.

use thiserror::Error;

/// Result type alias using stacklens's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for stacklens.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Rate limiter error: {0}")]
    RateLimit(String),

    #[error("Origin error: {0}")]
    Origin(String),

    #[error("Asset error: {0}")]
    Assets(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create a gateway error.
    pub fn gateway(msg: impl Into<String>) -> Self {
        Self::Gateway(msg.into())
    }

    /// Create a cache error.
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    /// Create a rate limiter error.
    pub fn rate_limit(msg: impl Into<String>) -> Self {
        Self::RateLimit(msg.into())
    }

    /// Create an origin error.
    pub fn origin(msg: impl Into<String>) -> Self {
        Self::Origin(msg.into())
    }

    /// Create an asset error.
    pub fn assets(msg: impl Into<String>) -> Self {
        Self::Assets(msg.into())
    }
}
