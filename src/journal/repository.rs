// Keyrotator - Journal repository
//
// One row per (run, old key), upserted as the rotation advances. A later
// revoked rotation of the same account supersedes earlier unfinished rows.

use chrono::{SecondsFormat, Utc};
use rusqlite::params;
use uuid::Uuid;

use crate::rotate::RotationPhase;

use super::db::Database;
use super::models::{JournalEntry, PhaseUpdate};
use super::JournalError;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over rotation phase tracking.
pub trait RotationJournal {
    /// Record (or advance) the phase of one candidate within a run.
    fn record(&self, update: &PhaseUpdate<'_>) -> Result<(), JournalError>;

    /// Rotations that minted a new key but never completed, and that no
    /// later completed rotation of the same account has superseded.
    fn unfinished(&self) -> Result<Vec<JournalEntry>, JournalError>;

    /// The most recent entries, newest first.
    fn history(&self, limit: usize) -> Result<Vec<JournalEntry>, JournalError>;
}

// ─── SQLite Implementation ──────────────────────────────────────────────────

const SELECT_COLUMNS: &str = "SELECT j.id, j.run_id, j.provider, j.project, j.account,
        j.old_key_id, j.new_key_id, j.phase, j.error, j.updated_at
     FROM rotation_journal j";

pub struct SqliteJournal<'a> {
    db: &'a Database,
}

impl<'a> SqliteJournal<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<JournalEntry> {
        let run_id_str: String = row.get(1)?;
        let phase_str: String = row.get(7)?;
        let updated_at_str: String = row.get(9)?;

        let run_id = Uuid::parse_str(&run_id_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let phase: RotationPhase = phase_str.parse().map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, e.into())
        })?;
        let updated_at = chrono::DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
            })?;

        Ok(JournalEntry {
            id: row.get(0)?,
            run_id,
            provider: row.get(2)?,
            project: row.get(3)?,
            account: row.get(4)?,
            old_key_id: row.get(5)?,
            new_key_id: row.get(6)?,
            phase,
            error: row.get(8)?,
            updated_at,
        })
    }

    fn query(&self, sql: &str, limit: Option<usize>) -> Result<Vec<JournalEntry>, JournalError> {
        let mut stmt = self.db.conn().prepare(sql)?;
        let rows = match limit {
            Some(limit) => stmt.query_map(params![limit as i64], Self::row_to_entry)?,
            None => stmt.query_map([], Self::row_to_entry)?,
        };
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl<'a> RotationJournal for SqliteJournal<'a> {
    fn record(&self, update: &PhaseUpdate<'_>) -> Result<(), JournalError> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        self.db.conn().execute(
            "INSERT INTO rotation_journal
                (run_id, provider, project, account, old_key_id, new_key_id, phase, error, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(run_id, old_key_id) DO UPDATE SET
                new_key_id = COALESCE(excluded.new_key_id, new_key_id),
                phase      = excluded.phase,
                error      = excluded.error,
                updated_at = excluded.updated_at",
            params![
                update.run_id.to_string(),
                update.key.provider.name,
                update.key.provider.project,
                update.key.account,
                update.key.id,
                update.new_key_id,
                update.phase.as_str(),
                update.error,
                now,
            ],
        )?;
        Ok(())
    }

    fn unfinished(&self) -> Result<Vec<JournalEntry>, JournalError> {
        let sql = format!(
            "{SELECT_COLUMNS}
             WHERE j.new_key_id IS NOT NULL
               AND j.phase != 'revoked'
               AND NOT EXISTS (
                   SELECT 1 FROM rotation_journal r
                   WHERE r.provider = j.provider
                     AND r.project = j.project
                     AND r.account = j.account
                     AND r.phase = 'revoked'
                     AND r.id > j.id
               )
             ORDER BY j.id"
        );
        self.query(&sql, None)
    }

    fn history(&self, limit: usize) -> Result<Vec<JournalEntry>, JournalError> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY j.id DESC LIMIT ?1");
        self.query(&sql, Some(limit))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
