// Keyrotator - Metrics error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Metrics API returned status {status}, expected 202")]
    Rejected { status: u16 },
}
