//! Error types for feature construction.

use thiserror::Error;

/// Result type for feature operations.
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Errors that can occur while building a feature matrix.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeatureError {
    /// No raw records were supplied at all. Operators should look at source
    /// coverage, not at the feature configuration.
    #[error("No input records to build features from")]
    EmptyInput,

    /// Records were supplied but none survived feature-row filtering.
    /// Operators should look at the lag/window configuration relative to the
    /// available history per region.
    #[error("No rows survived feature filtering ({input_rows} input rows, none with full history)")]
    InsufficientHistory {
        /// Number of raw records that went in
        input_rows: usize,
    },

    /// Rejected feature configuration.
    #[error("Invalid feature configuration: {0}")]
    InvalidConfig(String),

    /// Matrix construction with inconsistent dimensions.
    #[error("Inconsistent matrix shape: {0}")]
    InvalidShape(String),
}
