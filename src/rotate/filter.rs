// Keyrotator - Key Filter
//
// Decides which discovered keys are considered at all. Invalid keys (AWS
// human-user keys, unless included) are dropped first; the remaining keys
// are checked for eligibility against the run mode and the account filter.
// Keys belonging to the rotator itself are moved to the end of the list so
// the process does not lose its own access mid-run.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::{Config, ProviderServiceAccounts};
use crate::keys::Key;

use super::RotationError;

/// A letter, a literal dot, a letter: "first.last" style IAM user names.
static USER_KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z]\.[a-zA-Z]").expect("static regex is valid"));

/// Filter `keys` down to the eligible ones, with self keys last.
///
/// `account` is the single-account override from the command line. When
/// set, only keys of that account are eligible, regardless of mode.
pub fn filter_keys(
    keys: Vec<Key>,
    config: &Config,
    account: Option<&str>,
) -> Result<Vec<Key>, RotationError> {
    let mut eligible = Vec::new();
    let mut self_keys = Vec::new();

    for key in keys {
        if !valid_key(&key, config) {
            tracing::debug!(key_id = %key.id, name = %key.name, "Skipping user key");
            continue;
        }
        if !filter_key(&key, config, account)? {
            continue;
        }
        if is_self(&key, config) {
            tracing::info!(
                key_provider = %key.provider,
                account = %key.account,
                "Key belongs to the rotator itself, so will be processed last"
            );
            self_keys.push(key);
        } else {
            eligible.push(key);
        }
    }

    eligible.extend(self_keys);
    Ok(eligible)
}

/// Provider-specific validity rules.
fn valid_key(key: &Key, config: &Config) -> bool {
    match key.provider.name.as_str() {
        "aws" => config.include_aws_user_keys || !USER_KEY_PATTERN.is_match(&key.name),
        _ => true,
    }
}

fn filter_key(key: &Key, config: &Config, account: Option<&str>) -> Result<bool, RotationError> {
    if let Some(account) = account.filter(|a| !a.is_empty()) {
        return Ok(key.account == account);
    }
    if !config.rotation_mode {
        // Observe-only: every key is reported.
        return Ok(true);
    }
    let listed = defined_in_filter(&config.account_filter.accounts, key);
    match config.account_filter.mode.as_str() {
        "include" => Ok(listed),
        "exclude" => Ok(!listed),
        other => Err(RotationError::UnsupportedFilterMode(other.to_string())),
    }
}

fn defined_in_filter(filter: &[ProviderServiceAccounts], key: &Key) -> bool {
    filter
        .iter()
        .filter(|psa| psa.provider == key.provider)
        .any(|psa| psa.accounts.iter().any(|a| *a == key.account))
}

fn is_self(key: &Key, config: &Config) -> bool {
    config.cloud_providers.iter().any(|cp| {
        cp.name == key.provider.name
            && cp.project == key.provider.project
            && cp.self_account == key.account
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
