// Keyrotator - CLI Command Handlers
//
// Each function handles one CLI subcommand. `rotate` wires the production
// providers, writers, journal and metrics into a `Rotator`; `journal` reads
// the phase journal back.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::error::RotatorError;
use crate::journal::{Database, JournalEntry, RotationJournal, SqliteJournal};
use crate::keys::{GcpKeyProvider, KeyError, ProviderSet};
use crate::location::{HttpWriterFactory, Propagator};
use crate::metrics::DatadogMetrics;
use crate::rotate::{RunOptions, RunSummary, Rotator};

use super::Commands;

/// Default directory for Keyrotator data files.
fn data_dir() -> PathBuf {
    let base = dirs_next::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("keyrotator")
}

/// Journal database location: configured path, else the data dir.
fn journal_path(config: &Config) -> PathBuf {
    config
        .journal_path
        .clone()
        .unwrap_or_else(|| data_dir().join("journal.db"))
}

/// Execute the parsed CLI command.
pub async fn execute(command: Commands) -> Result<(), RotatorError> {
    match command {
        Commands::Rotate {
            config,
            account,
            provider,
            project,
            observe,
            json,
        } => {
            let options = RunOptions {
                account,
                provider,
                project,
            };
            cmd_rotate(&config, options, observe, json).await
        }
        Commands::Journal {
            config,
            all,
            limit,
            json,
        } => cmd_journal(config.as_deref(), all, limit, json),
    }
}

// ─── Rotate ──────────────────────────────────────────────────────────────────

async fn cmd_rotate(
    config_path: &Path,
    options: RunOptions,
    observe: bool,
    json: bool,
) -> Result<(), RotatorError> {
    let mut config = Config::from_file(config_path)?;
    if observe {
        config.rotation_mode = false;
    }
    tracing::debug!(credentials = ?config.credentials, "Resolved credentials");

    let providers = build_providers(&config, &options)?;
    let propagator = Propagator::new(Box::new(HttpWriterFactory::new()?));
    let db = Database::open(&journal_path(&config))?;
    let journal = SqliteJournal::new(&db);

    let metrics = match config.credentials.datadog_api_key.clone() {
        Some(api_key) if !config.rotation_mode => {
            Some(DatadogMetrics::new(api_key, config.datadog.clone())?)
        }
        _ => None,
    };

    let mut rotator = Rotator::new(&config, &providers, &propagator, &journal);
    if let Some(ref metrics) = metrics {
        rotator = rotator.with_metrics(metrics);
    }

    let summary = rotator.run(&options).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

/// Provider names this binary can discover keys at.
const SUPPORTED_PROVIDERS: &[&str] = &["gcp"];

/// Register a provider implementation for every provider name in scope.
/// Any unsupported name fails here, before a single key is listed.
fn build_providers(config: &Config, options: &RunOptions) -> Result<ProviderSet, RotatorError> {
    let names: Vec<&str> = match options.provider.as_deref().filter(|p| !p.is_empty()) {
        Some(name) => vec![name],
        None => config.cloud_providers.iter().map(|cp| cp.name.as_str()).collect(),
    };
    if let Some(unsupported) = names.iter().find(|n| !SUPPORTED_PROVIDERS.contains(n)) {
        return Err(KeyError::UnsupportedProvider(unsupported.to_string()).into());
    }

    let mut set = ProviderSet::new();
    if names.contains(&"gcp") {
        set = set.register("gcp", Arc::new(GcpKeyProvider::from_env()?));
    }
    Ok(set)
}

fn print_summary(summary: &RunSummary) {
    println!("Run {}", summary.run_id);
    println!("  Discovered: {}", summary.discovered);
    println!("  Eligible:   {}", summary.eligible);
    if summary.observed {
        println!("  Mode:       observe (no keys rotated)");
        return;
    }
    println!("  Candidates: {}", summary.candidates);
    println!("  Rotated:    {}", summary.rotated.len());
    for outcome in &summary.rotated {
        println!(
            "  ✓ {} │ {} -> {} │ {} location(s)",
            outcome.account,
            outcome.key_id,
            outcome.new_key_id,
            outcome.updated.len()
        );
    }
}

// ─── Journal ─────────────────────────────────────────────────────────────────

fn cmd_journal(
    config_path: Option<&Path>,
    all: bool,
    limit: usize,
    json: bool,
) -> Result<(), RotatorError> {
    let config = match config_path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let path = journal_path(&config);
    if !path.exists() {
        if json {
            println!("[]");
        } else {
            println!("No journal found at {}", path.display());
        }
        return Ok(());
    }

    let db = Database::open(&path)?;
    let journal = SqliteJournal::new(&db);

    let (title, entries) = if all {
        ("Recent rotations", journal.history(limit)?)
    } else {
        ("Unfinished rotations (new key left live)", journal.unfinished()?)
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() && !all {
        println!("No unfinished rotations.");
    } else {
        print_entries(title, &entries);
    }
    Ok(())
}

/// Orphaned entries (new key minted, rotation never completed) get a `!`.
fn print_entries(title: &str, entries: &[JournalEntry]) {
    println!("{} ({}):", title, entries.len());
    println!("{:-<80}", "");
    for entry in entries {
        let marker = if entry.is_orphaned() { '!' } else { ' ' };
        println!("{} {}", marker, entry);
    }
    println!("{:-<80}", "");
}
