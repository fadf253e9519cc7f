// Keyrotator - Run orchestration
//
// One run: validate the command-line scope, discover keys for every provider
// in scope, filter them, then either report their ages (observe mode) or
// select candidates and rotate them.

use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::journal::RotationJournal;
use crate::keys::{Key, KeyProvider, ProviderRef};
use crate::location::Propagator;
use crate::metrics::KeyMetrics;

use super::{filter_keys, rotation_candidates, Executor, RotationError, RotationOutcome};

/// Command-line narrowing of a run. Empty strings count as unset.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub account: Option<String>,
    pub provider: Option<String>,
    pub project: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub discovered: usize,
    pub eligible: usize,
    pub candidates: usize,
    pub rotated: Vec<RotationOutcome>,
    /// True when the run only reported key ages.
    pub observed: bool,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// An account override needs a provider, and GCP needs a project.
pub fn validate_flags(
    account: Option<&str>,
    provider: Option<&str>,
    project: Option<&str>,
) -> Result<(), RotationError> {
    let (account, provider, project) = (non_empty(account), non_empty(provider), non_empty(project));
    if account.is_some() && provider.is_none() {
        return Err(RotationError::InvalidFlags(
            "both account AND provider flags must be set",
        ));
    }
    if provider == Some("gcp") && project.is_none() {
        return Err(RotationError::InvalidFlags(
            "project flag must be set when using the GCP provider",
        ));
    }
    Ok(())
}

/// Providers in scope: the flag-supplied one if any, else every configured one.
pub fn key_providers(
    provider: Option<&str>,
    project: Option<&str>,
    config: &Config,
) -> Vec<ProviderRef> {
    match non_empty(provider) {
        Some(name) => vec![ProviderRef::new(name, project.unwrap_or_default())],
        None => config
            .cloud_providers
            .iter()
            .map(|cp| ProviderRef::new(cp.name.clone(), cp.project.clone()))
            .collect(),
    }
}

pub struct Rotator<'a> {
    config: &'a Config,
    keys: &'a dyn KeyProvider,
    propagator: &'a Propagator,
    journal: &'a dyn RotationJournal,
    metrics: Option<&'a dyn KeyMetrics>,
}

impl<'a> Rotator<'a> {
    pub fn new(
        config: &'a Config,
        keys: &'a dyn KeyProvider,
        propagator: &'a Propagator,
        journal: &'a dyn RotationJournal,
    ) -> Self {
        Self {
            config,
            keys,
            propagator,
            journal,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: &'a dyn KeyMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn run(&self, options: &RunOptions) -> Result<RunSummary, RotationError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("run", %run_id);
        self.run_inner(run_id, options).instrument(span).await
    }

    async fn run_inner(
        &self,
        run_id: Uuid,
        options: &RunOptions,
    ) -> Result<RunSummary, RotationError> {
        let account = options.account.as_deref();
        let provider = options.provider.as_deref();
        let project = options.project.as_deref();
        validate_flags(account, provider, project)?;

        let discovered = self.discover(&key_providers(provider, project, self.config)).await?;
        let discovered_count = discovered.len();
        tracing::info!(count = discovered_count, "Discovered keys");

        let eligible = filter_keys(discovered, self.config, non_empty(account))?;
        tracing::info!(count = eligible.len(), "Filtered keys based on current config");

        let mut summary = RunSummary {
            run_id,
            discovered: discovered_count,
            eligible: eligible.len(),
            candidates: 0,
            rotated: Vec::new(),
            observed: !self.config.rotation_mode,
        };

        if summary.observed {
            self.report(&eligible).await;
            return Ok(summary);
        }

        let candidates = rotation_candidates(
            eligible,
            &self.config.account_key_locations,
            self.config.default_rotation_age_threshold_mins,
        )?;
        summary.candidates = candidates.len();
        tracing::info!(count = candidates.len(), "Finalised rotation candidates");

        let executor = Executor::new(self.keys, self.propagator, self.journal, run_id);
        summary.rotated = executor
            .rotate(&candidates, &self.config.credentials)
            .await?;
        tracing::info!(rotated = summary.rotated.len(), "Rotation run complete");
        Ok(summary)
    }

    async fn discover(&self, providers: &[ProviderRef]) -> Result<Vec<Key>, RotationError> {
        let mut keys = Vec::new();
        for provider in providers {
            let found = self
                .keys
                .list_keys(provider, self.config.include_inactive_keys)
                .await
                .map_err(|source| RotationError::Discovery {
                    provider: provider.to_string(),
                    source,
                })?;
            tracing::debug!(key_provider = %provider, count = found.len(), "Listed keys");
            keys.extend(found);
        }
        Ok(keys)
    }

    /// Observe mode: metrics failures never fail the run.
    async fn report(&self, keys: &[Key]) {
        for key in keys {
            tracing::info!(
                key_provider = %key.provider,
                account = %key.account,
                key_id = %key.id,
                key_age_mins = key.age_mins,
                status = %key.status,
                "Observed key"
            );
        }
        match self.metrics {
            Some(metrics) => {
                if let Err(e) = metrics.post_key_ages(keys).await {
                    tracing::warn!(error = %e, "Failed to post key age metrics");
                }
            }
            None => tracing::debug!("No metrics API key configured, skipping key age metrics"),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
