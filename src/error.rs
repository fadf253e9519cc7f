// Keyrotator - Top-level error types
//
// Aggregates module errors into a single enum for the application boundary.

use thiserror::Error;

/// Top-level error type for all Keyrotator operations.
#[derive(Debug, Error)]
pub enum RotatorError {
    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Rotation error: {0}")]
    Rotation(#[from] crate::rotate::RotationError),

    #[error("Key provider error: {0}")]
    Key(#[from] crate::keys::KeyError),

    #[error("Key location error: {0}")]
    Location(#[from] crate::location::LocationError),

    #[error("Journal error: {0}")]
    Journal(#[from] crate::journal::JournalError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] crate::metrics::MetricsError),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}
