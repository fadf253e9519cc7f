// Keyrotator - Key data models
//
// SECURITY: `NewCredential` holds freshly minted key material. The secret is
// private, zeroized on drop, and never included in Debug or Display output.

use std::fmt;

use serde::Deserialize;
use zeroize::Zeroizing;

/// A cloud provider plus the project it is scoped to ("" when the provider
/// has no notion of projects, e.g. AWS).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct ProviderRef {
    pub name: String,
    #[serde(default)]
    pub project: String,
}

impl ProviderRef {
    pub fn new(name: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project: project.into(),
        }
    }
}

impl fmt::Display for ProviderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.project.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.name, self.project)
        }
    }
}

/// A key discovered at a provider. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Key {
    pub id: String,
    pub provider: ProviderRef,
    /// Short account name, used to look up key locations and filters.
    pub account: String,
    /// Fully qualified account identity (e.g. a service account e-mail),
    /// used to deduplicate rotation candidates.
    pub full_account: String,
    /// Age in minutes at discovery time.
    pub age_mins: f64,
    pub status: String,
    /// Display name. For AWS this is the IAM user name.
    pub name: String,
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}) age {:.0}m",
            self.id, self.account, self.provider, self.age_mins
        )
    }
}

/// The replacement credential returned by key creation.
/// Exists only in memory and is passed by reference through propagation.
pub struct NewCredential {
    pub provider: String,
    pub key_id: String,
    secret: Zeroizing<String>,
}

impl NewCredential {
    pub fn new(provider: impl Into<String>, key_id: impl Into<String>, secret: String) -> Self {
        Self {
            provider: provider.into(),
            key_id: key_id.into(),
            secret: Zeroizing::new(secret),
        }
    }

    /// Access the raw secret. Only location writers should call this.
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for NewCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewCredential")
            .field("provider", &self.provider)
            .field("key_id", &self.key_id)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
