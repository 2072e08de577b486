//! Error types for collection_binder

use reqwest::StatusCode;

/// Unified error type for collection_binder operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed (connection refused, timeout, etc.)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Response could not be used: error status or a body of the wrong shape
    #[error("Transport error from {url} (HTTP {status}): {reason}")]
    Transport {
        url: String,
        status: StatusCode,
        reason: String,
    },
    /// A record's card markup has no recoverable name
    #[error("Malformed record: {0}")]
    MalformedRecord(String),
    /// Failed to parse a local JSON document
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// CSV serialization error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// True for failures talking to a remote service. These abort a run.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Transport { .. })
    }
}

/// Result alias for collection_binder operations
pub type Result<T> = std::result::Result<T, Error>;
