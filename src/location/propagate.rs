// Keyrotator - Location Propagator
//
// Fans a new key out to every destination configured for one account:
// CircleCI variables first, then the GitLab variable, then Kubernetes
// secrets. Writes are sequential and stop at the first failure. Earlier
// writes are not undone, so the old key must stay valid until a later run
// completes propagation.

use crate::config::{Credentials, KeyLocations};
use crate::keys::NewCredential;

use super::{Destination, LocationError, UpdatedLocation, WriterFactory};

/// Ordered destinations for an account: all CI, the VCS project (if any),
/// then all cluster secrets.
pub fn destinations(locations: &KeyLocations) -> Vec<Destination> {
    let mut out: Vec<Destination> = locations
        .circleci
        .iter()
        .cloned()
        .map(Destination::CircleCi)
        .collect();

    if let Some(gitlab) = locations.gitlab.as_ref().filter(|g| !g.project.is_empty()) {
        out.push(Destination::GitLab(gitlab.clone()));
    }

    out.extend(locations.k8s.iter().cloned().map(Destination::K8s));
    out
}

pub struct Propagator {
    factory: Box<dyn WriterFactory>,
}

impl Propagator {
    pub fn new(factory: Box<dyn WriterFactory>) -> Self {
        Self { factory }
    }

    /// Write `key` to every destination in `locations`, in order.
    ///
    /// Returns the first write error unchanged; destinations after it are
    /// not attempted.
    pub async fn propagate(
        &self,
        account: &str,
        locations: &KeyLocations,
        key: &NewCredential,
        credentials: &Credentials,
    ) -> Result<Vec<UpdatedLocation>, LocationError> {
        let mut updated = Vec::new();

        for destination in destinations(locations) {
            let writer = self.factory.writer(&destination);
            let record = writer
                .write(&locations.service_account_name, key, credentials)
                .await
                .inspect_err(|e| {
                    tracing::error!(
                        account,
                        key_id = %key.key_id,
                        location_type = destination.kind(),
                        location_id = %destination.id(),
                        error = %e,
                        "Key location update failed"
                    );
                })?;

            tracing::debug!(
                account,
                location_type = record.location_type,
                location_id = %record.location_id,
                "Key location updated"
            );
            updated.push(record);
        }

        tracing::info!(
            account,
            key_provider = %key.provider,
            key_id = %key.key_id,
            key_location_updates = ?updated,
            "Key locations updated"
        );
        Ok(updated)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
