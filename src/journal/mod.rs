// Keyrotator - Journal Module
//
// A SQLite record of rotation phase markers: which old key was being
// replaced, which new key was minted for it, and how far the protocol got.
// It never stores key material. Its main job is to make orphaned new keys
// (created but not fully propagated) visible across runs.

mod db;
mod error;
mod models;
mod repository;

pub use db::Database;
pub use error::JournalError;
pub use models::{JournalEntry, PhaseUpdate};
pub use repository::{RotationJournal, SqliteJournal};
