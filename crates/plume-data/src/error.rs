//! Error types for storage and ingestion.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur during storage and ingestion.
#[derive(Debug, Error)]
pub enum DataError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// OpenAQ API error
    #[error("OpenAQ API error: {0}")]
    OpenAqApi(String),

    /// Retries exhausted against a retryable status
    #[error("Request failed with HTTP {status} after {attempts} attempts: {url}")]
    RetriesExhausted {
        /// Final HTTP status code observed
        status: u16,
        /// Number of attempts made, including the first
        attempts: u32,
        /// URL that kept failing
        url: String,
    },

    /// Payload parsing error
    #[error("Payload parsing error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Timestamp conversion error
    #[error("Timestamp conversion error: {0}")]
    TimeConversion(String),

    /// Store error
    #[error("Store error: {0}")]
    Store(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
