// Keyrotator - Key Lifecycle Provider
//
// The seam between the rotation engine and the cloud providers. The engine
// never talks to a provider API directly; it lists, creates and deletes keys
// through `KeyProvider`, and `ProviderSet` routes each call to the
// implementation registered for the key's provider name.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::{Key, KeyError, NewCredential, ProviderRef};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Key lifecycle operations for one or more cloud providers.
///
/// The engine calls `create_key` and `delete_key` at most once per candidate
/// and never retries them.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    /// List the keys visible for a provider/project.
    async fn list_keys(
        &self,
        provider: &ProviderRef,
        include_inactive: bool,
    ) -> Result<Vec<Key>, KeyError>;

    /// Mint a new key for the same account as `key`.
    async fn create_key(&self, key: &Key) -> Result<NewCredential, KeyError>;

    /// Delete `key` at the provider.
    async fn delete_key(&self, key: &Key) -> Result<(), KeyError>;
}

// ─── Dispatcher ──────────────────────────────────────────────────────────────

/// Routes calls to the provider implementation registered under the key's
/// provider name ("gcp", "aws", ...).
#[derive(Default, Clone)]
pub struct ProviderSet {
    providers: HashMap<String, Arc<dyn KeyProvider>>,
}

impl std::fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSet")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ProviderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` for keys whose provider name is `name`.
    pub fn register(mut self, name: impl Into<String>, provider: Arc<dyn KeyProvider>) -> Self {
        self.providers.insert(name.into(), provider);
        self
    }

    fn resolve(&self, name: &str) -> Result<&Arc<dyn KeyProvider>, KeyError> {
        self.providers
            .get(name)
            .ok_or_else(|| KeyError::UnsupportedProvider(name.to_string()))
    }
}

#[async_trait]
impl KeyProvider for ProviderSet {
    async fn list_keys(
        &self,
        provider: &ProviderRef,
        include_inactive: bool,
    ) -> Result<Vec<Key>, KeyError> {
        self.resolve(&provider.name)?
            .list_keys(provider, include_inactive)
            .await
    }

    async fn create_key(&self, key: &Key) -> Result<NewCredential, KeyError> {
        self.resolve(&key.provider.name)?.create_key(key).await
    }

    async fn delete_key(&self, key: &Key) -> Result<(), KeyError> {
        self.resolve(&key.provider.name)?.delete_key(key).await
    }
}

// ─── In-Memory Mock for Testing ──────────────────────────────────────────────


// ─── Tests ───────────────────────────────────────────────────────────────────
