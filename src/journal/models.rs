// Keyrotator - Journal data models

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::keys::Key;
use crate::rotate::RotationPhase;

/// A phase marker to record for one candidate of one run.
#[derive(Debug, Clone)]
pub struct PhaseUpdate<'a> {
    pub run_id: Uuid,
    pub key: &'a Key,
    pub new_key_id: Option<&'a str>,
    pub phase: RotationPhase,
    pub error: Option<String>,
}

/// A stored journal row. Identifiers and phase only, never key material.
#[derive(Debug, Clone, Serialize)]
pub struct JournalEntry {
    pub id: i64,
    pub run_id: Uuid,
    pub provider: String,
    pub project: String,
    pub account: String,
    pub old_key_id: String,
    pub new_key_id: Option<String>,
    pub phase: RotationPhase,
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl JournalEntry {
    /// A new key exists at the provider but the rotation never reached
    /// revocation: the new key is orphaned or the old key still needs deleting.
    pub fn is_orphaned(&self) -> bool {
        self.new_key_id.is_some() && self.phase != RotationPhase::Revoked
    }
}

impl fmt::Display for JournalEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {:10} {}/{} {} old={} new={}",
            self.updated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.phase,
            self.provider,
            if self.project.is_empty() { "-" } else { self.project.as_str() },
            self.account,
            self.old_key_id,
            self.new_key_id.as_deref().unwrap_or("-"),
        )?;
        if let Some(ref error) = self.error {
            write!(f, " error={}", error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(new_key_id: Option<&str>, phase: RotationPhase) -> JournalEntry {
        JournalEntry {
            id: 7,
            run_id: Uuid::nil(),
            provider: "gcp".to_string(),
            project: "proj".to_string(),
            account: "deployer".to_string(),
            old_key_id: "k1".to_string(),
            new_key_id: new_key_id.map(str::to_string),
            phase,
            error: Some("write to org/app rejected".to_string()),
            updated_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_orphaned_only_with_new_key_and_unrevoked() {
        assert!(entry(Some("k1-new"), RotationPhase::Failed).is_orphaned());
        assert!(entry(Some("k1-new"), RotationPhase::Propagated).is_orphaned());
        assert!(!entry(Some("k1-new"), RotationPhase::Revoked).is_orphaned());
        assert!(!entry(None, RotationPhase::Failed).is_orphaned());
    }

    #[test]
    fn test_json_output_shape() {
        let value = serde_json::to_value(entry(Some("k1-new"), RotationPhase::Failed)).unwrap();
        assert_eq!(value["phase"], "failed");
        assert_eq!(value["run_id"], Uuid::nil().to_string());
        assert_eq!(value["new_key_id"], "k1-new");
        assert_eq!(value["updated_at"], "2024-05-01T12:00:00Z");
    }
}
