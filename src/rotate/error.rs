// Keyrotator - Rotation error types
//
// Every variant aborts the run. Phase-specific variants carry the account
// and key ids needed to find the half-finished rotation again.

use thiserror::Error;

use crate::keys::KeyError;
use crate::location::LocationError;

use super::RotationPhase;

#[derive(Debug, Error)]
pub enum RotationError {
    #[error("No account key locations (in config) mapped to account: {0}")]
    NoLocationConfig(String),

    #[error("Filter mode '{0}' is not supported")]
    UnsupportedFilterMode(String),

    #[error("Invalid run flags: {0}")]
    InvalidFlags(&'static str),

    #[error("Key discovery failed for {provider}: {source}")]
    Discovery {
        provider: String,
        #[source]
        source: KeyError,
    },

    #[error("Creating new key for account {account} (old key {key_id}) failed: {source}")]
    Create {
        account: String,
        key_id: String,
        #[source]
        source: KeyError,
    },

    #[error(
        "Propagating new key {new_key_id} for account {account} failed; \
         old key {key_id} left in place and new key left live: {source}"
    )]
    Propagation {
        account: String,
        key_id: String,
        new_key_id: String,
        #[source]
        source: LocationError,
    },

    #[error(
        "Deleting old key {key_id} for account {account} failed after new key \
         {new_key_id} was propagated: {source}"
    )]
    Revoke {
        account: String,
        key_id: String,
        new_key_id: String,
        #[source]
        source: KeyError,
    },
}

impl RotationError {
    /// Configuration problems are detected before any key is touched.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RotationError::NoLocationConfig(_)
                | RotationError::UnsupportedFilterMode(_)
                | RotationError::InvalidFlags(_)
        )
    }

    /// The phase the rotation was in when it failed, if the failure happened
    /// inside the create -> propagate -> revoke protocol.
    pub fn phase(&self) -> Option<RotationPhase> {
        match self {
            RotationError::Create { .. } => Some(RotationPhase::Pending),
            RotationError::Propagation { .. } => Some(RotationPhase::Created),
            RotationError::Revoke { .. } => Some(RotationPhase::Propagated),
            _ => None,
        }
    }

    /// Id of a new key that exists at the provider but is not fully live.
    pub fn orphaned_key_id(&self) -> Option<&str> {
        match self {
            RotationError::Propagation { new_key_id, .. } => Some(new_key_id),
            _ => None,
        }
    }
}
