//! Error types shared by the store adapters and the keyspace aggregator.

use std::sync::Arc;

use thiserror::Error;

/// Underlying cause carried by transport errors.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The named key does not exist at lookup time.
    #[error("Key '{key}' not found")]
    NotFound { key: String },

    /// Network, connection or server-side failure talking to the store.
    #[error("Store unavailable: {message}")]
    Transient {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Store operation timed out")]
    Timeout,

    /// The store answered, but not in the shape the request expects.
    #[error("Malformed store reply: {message}")]
    Malformed { message: String },

    /// A single key's value could not be decoded.
    #[error("Failed to decode value of '{key}': {message}")]
    ValueDecode { key: String, message: String },
}

impl StoreError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient { message: message.into(), source: None }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed { message: message.into() }
    }

    /// Failures of the transport itself; a later identical call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::Timeout)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config error: {key} must be valid (got '{value}')")]
    Invalid { key: String, value: String },
}
