// Keyrotator - Location writer error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Write to {location} rejected with status {status}: {body}")]
    Rejected {
        location: String,
        status: u16,
        body: String,
    },

    #[error("Missing credential for location writer: {0}")]
    MissingCredential(&'static str),
}
