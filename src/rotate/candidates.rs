// Keyrotator - Candidate Selection
//
// Turns the eligible key list into rotation candidates: every key must map
// to configured key locations, only the first key seen per full account is
// taken, and only keys at least as old as the effective threshold qualify.

use std::collections::HashSet;

use crate::config::KeyLocations;
use crate::keys::Key;

use super::RotationError;

/// A key selected for rotation in this run.
#[derive(Debug, Clone)]
pub struct RotationCandidate {
    pub key: Key,
    pub locations: KeyLocations,
    pub threshold_mins: u32,
}

/// Select candidates from `keys`, preserving input order.
///
/// A key whose account has no key locations is a configuration gap and
/// fails the whole selection, even if the key would otherwise be skipped.
pub fn rotation_candidates(
    keys: Vec<Key>,
    key_locations: &[KeyLocations],
    default_threshold_mins: u32,
) -> Result<Vec<RotationCandidate>, RotationError> {
    let mut selected: HashSet<String> = HashSet::new();
    let mut candidates = Vec::new();

    for key in keys {
        let locations = account_key_locations(&key.account, key_locations)?;

        if selected.contains(&key.full_account) {
            tracing::info!(
                account = %key.account,
                key_id = %key.id,
                "Skipping key as a key for this account is already a rotation candidate"
            );
            continue;
        }

        let threshold_mins = rotation_age_threshold(locations, default_threshold_mins);
        if key.age_mins < f64::from(threshold_mins) {
            tracing::info!(
                account = %key.account,
                key_id = %key.id,
                key_age_mins = key.age_mins,
                threshold_mins,
                "Skipping key as it is younger than the rotation threshold"
            );
            continue;
        }

        selected.insert(key.full_account.clone());
        candidates.push(RotationCandidate {
            key,
            locations: locations.clone(),
            threshold_mins,
        });
    }

    Ok(candidates)
}

/// Per-account override when set (> 0), else the run default.
fn rotation_age_threshold(locations: &KeyLocations, default_threshold_mins: u32) -> u32 {
    if locations.rotation_age_threshold_mins > 0 {
        locations.rotation_age_threshold_mins
    } else {
        default_threshold_mins
    }
}

fn account_key_locations<'a>(
    account: &str,
    key_locations: &'a [KeyLocations],
) -> Result<&'a KeyLocations, RotationError> {
    key_locations
        .iter()
        .find(|l| l.service_account_name == account)
        .ok_or_else(|| RotationError::NoLocationConfig(account.to_string()))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
