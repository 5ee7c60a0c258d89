//! Error types for node-crawler
//!
//! Failures fall into four classes:
//! - transport failures (network errors, timeouts, non-2xx statuses), retried
//! - blocked failures (HTTP 403), retried after the blocked-retry delay
//! - not-found failures (a stage's heuristics came up empty), terminal
//! - validation failures (empty subscription body), terminal

use crate::types::PipelineStage;
use thiserror::Error;

/// Result type alias for node-crawler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for node-crawler
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "site.base_url")
        key: Option<String>,
    },

    /// URL could not be parsed or is not absolute HTTP(S)
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The offending URL
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// Network error (connect, timeout, reset, body read)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Server answered with a non-2xx status other than 403
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// Status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Server answered 403, most likely an anti-crawler block
    #[error("request blocked (HTTP 403) by {url}")]
    Blocked {
        /// Requested URL
        url: String,
    },

    /// A stage found no valid candidate
    #[error("{stage} not found: {reason}")]
    NotFound {
        /// Stage that came up empty
        stage: PipelineStage,
        /// What was tried
        reason: String,
    },

    /// Downloaded content failed validation
    #[error("validation failed: {0}")]
    Validation(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a `NotFound` error
    pub fn not_found(stage: PipelineStage, reason: impl Into<String>) -> Self {
        Error::NotFound {
            stage,
            reason: reason.into(),
        }
    }

    /// Shorthand for a `Config` error tied to a key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    /// Stage a `NotFound` error belongs to
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            Error::NotFound { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// True for failures produced by the HTTP layer
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::HttpStatus { .. } | Error::Blocked { .. }
        )
    }
}
