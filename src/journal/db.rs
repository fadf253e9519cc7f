// Keyrotator - Journal database management
//
// Opens the SQLite journal and creates its schema. The journal holds phase
// markers only, so the file is not encrypted.

use std::path::Path;

use rusqlite::Connection;

use super::JournalError;

/// Wrapper around the journal's SQLite connection.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the journal database at the given path, creating
    /// parent directories as needed.
    pub fn open(path: &Path) -> Result<Self, JournalError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.run_migrations()?;

        tracing::debug!(path = %path.display(), "Opened rotation journal");
        Ok(db)
    }

    /// Open an in-memory database (for testing only).
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, JournalError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    /// Get a reference to the underlying connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn run_migrations(&self) -> Result<(), JournalError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS rotation_journal (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                run_id      TEXT NOT NULL,
                provider    TEXT NOT NULL,
                project     TEXT NOT NULL DEFAULT '',
                account     TEXT NOT NULL,
                old_key_id  TEXT NOT NULL,
                new_key_id  TEXT,
                phase       TEXT NOT NULL,
                error       TEXT,
                updated_at  TEXT NOT NULL,
                UNIQUE(run_id, old_key_id)
            );

            CREATE INDEX IF NOT EXISTS idx_journal_account
                ON rotation_journal(provider, project, account);
            ",
        )?;
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_schema_and_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("journal.db");

        let db = Database::open(&path).unwrap();
        assert!(path.exists());

        let count: i64 = db
            .conn()
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = 'rotation_journal'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("journal.db");

        drop(Database::open(&path).unwrap());
        assert!(Database::open(&path).is_ok(), "reopening must not fail");
    }
}
