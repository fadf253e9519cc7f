// Keyrotator - Journal error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
