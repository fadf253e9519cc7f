// Keyrotator - Rotation Executor
//
// Runs the create -> propagate -> revoke protocol for each candidate, one at
// a time, in candidate order. The first failure aborts the run: the old key
// of the failing candidate is never deleted and later candidates are never
// attempted. Nothing is rolled back.
//
// Each phase transition is written to the journal. Journal failures are
// logged and otherwise ignored; the provider state is the source of truth.

use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Credentials;
use crate::journal::{PhaseUpdate, RotationJournal};
use crate::keys::{Key, KeyProvider};
use crate::location::{Propagator, UpdatedLocation};

use super::{RotationCandidate, RotationError, RotationPhase};

/// A completed rotation.
#[derive(Debug, Clone, Serialize)]
pub struct RotationOutcome {
    pub account: String,
    pub key_id: String,
    pub new_key_id: String,
    pub updated: Vec<UpdatedLocation>,
}

pub struct Executor<'a> {
    keys: &'a dyn KeyProvider,
    propagator: &'a Propagator,
    journal: &'a dyn RotationJournal,
    run_id: Uuid,
}

impl<'a> Executor<'a> {
    pub fn new(
        keys: &'a dyn KeyProvider,
        propagator: &'a Propagator,
        journal: &'a dyn RotationJournal,
        run_id: Uuid,
    ) -> Self {
        Self {
            keys,
            propagator,
            journal,
            run_id,
        }
    }

    /// Rotate every candidate in order, stopping at the first failure.
    pub async fn rotate(
        &self,
        candidates: &[RotationCandidate],
        credentials: &Credentials,
    ) -> Result<Vec<RotationOutcome>, RotationError> {
        let mut outcomes = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let span = tracing::info_span!(
                "rotation",
                run_id = %self.run_id,
                account = %candidate.key.account,
                key_id = %candidate.key.id,
            );
            let outcome = self
                .rotate_one(candidate, credentials)
                .instrument(span)
                .await?;
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    async fn rotate_one(
        &self,
        candidate: &RotationCandidate,
        credentials: &Credentials,
    ) -> Result<RotationOutcome, RotationError> {
        let key = &candidate.key;
        tracing::info!(
            key_provider = %key.provider,
            key_age_mins = key.age_mins,
            threshold_mins = candidate.threshold_mins,
            "Rotating key"
        );
        let mut progress = Progress::start(key);
        self.record(&progress, None);

        let new_key = match self.keys.create_key(key).await {
            Ok(new_key) => new_key,
            Err(source) => {
                return Err(self.fail(
                    &mut progress,
                    RotationError::Create {
                        account: key.account.clone(),
                        key_id: key.id.clone(),
                        source,
                    },
                ))
            }
        };
        tracing::info!(new_key_id = %new_key.key_id, "New key created");
        progress.new_key_id = Some(new_key.key_id.clone());
        self.advance(&mut progress, RotationPhase::Created, None);

        let updated = match self
            .propagator
            .propagate(&key.account, &candidate.locations, &new_key, credentials)
            .await
        {
            Ok(updated) => updated,
            Err(source) => {
                return Err(self.fail(
                    &mut progress,
                    RotationError::Propagation {
                        account: key.account.clone(),
                        key_id: key.id.clone(),
                        new_key_id: new_key.key_id.clone(),
                        source,
                    },
                ))
            }
        };
        self.advance(&mut progress, RotationPhase::Propagated, None);

        if let Err(source) = self.keys.delete_key(key).await {
            return Err(self.fail(
                &mut progress,
                RotationError::Revoke {
                    account: key.account.clone(),
                    key_id: key.id.clone(),
                    new_key_id: new_key.key_id.clone(),
                    source,
                },
            ));
        }
        self.advance(&mut progress, RotationPhase::Revoked, None);
        tracing::info!(new_key_id = %new_key.key_id, "Old key deleted");

        Ok(RotationOutcome {
            account: key.account.clone(),
            key_id: key.id.clone(),
            new_key_id: new_key.key_id.clone(),
            updated,
        })
    }

    /// Journal the failure and log it, returning the error for propagation.
    fn fail(&self, progress: &mut Progress<'_>, err: RotationError) -> RotationError {
        let failed_phase = progress.phase;
        self.advance(progress, RotationPhase::Failed, Some(err.to_string()));
        match err.orphaned_key_id() {
            Some(orphan) => tracing::error!(
                %failed_phase,
                orphaned_key_id = orphan,
                error = %err,
                "Rotation aborted; new key exists but is not fully propagated"
            ),
            None => tracing::error!(%failed_phase, error = %err, "Rotation aborted"),
        }
        err
    }

    /// Move `progress` to `next` and journal it. Only forward transitions
    /// (or failure from a non-terminal phase) are legal.
    fn advance(&self, progress: &mut Progress<'_>, next: RotationPhase, error: Option<String>) {
        if !progress.phase.can_transition_to(next) {
            tracing::error!(from = %progress.phase, to = %next, "Illegal rotation phase transition");
            return;
        }
        progress.phase = next;
        self.record(progress, error);
    }

    fn record(&self, progress: &Progress<'_>, error: Option<String>) {
        let update = PhaseUpdate {
            run_id: self.run_id,
            key: progress.key,
            new_key_id: progress.new_key_id.as_deref(),
            phase: progress.phase,
            error,
        };
        if let Err(e) = self.journal.record(&update) {
            tracing::warn!(phase = %progress.phase, error = %e, "Failed to record rotation phase");
        }
    }
}

/// Where one candidate's rotation currently stands.
struct Progress<'k> {
    key: &'k Key,
    new_key_id: Option<String>,
    phase: RotationPhase,
}

impl<'k> Progress<'k> {
    fn start(key: &'k Key) -> Self {
        Self {
            key,
            new_key_id: None,
            phase: RotationPhase::Pending,
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
