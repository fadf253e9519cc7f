// Keyrotator - Key provider error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider API rejected {operation} with status {status}: {body}")]
    Rejected {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("Provider '{0}' is not supported")]
    UnsupportedProvider(String),

    #[error("Missing provider token: set {0}")]
    MissingToken(&'static str),

    #[error("Malformed provider response: {0}")]
    Malformed(String),
}
