// Keyrotator - Location Module
//
// Destinations that hold a copy of an account's key (CI variables, VCS
// project variables, cluster secrets) and the writers that update them.
// The propagator only ever sees `Box<dyn KeyWriter>`; the concrete kind is
// decided once, by the `WriterFactory`.

mod circleci;
mod error;
mod gitlab;
mod k8s;
mod propagate;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::{CircleCiLocation, Credentials, GitLabLocation, K8sLocation};
use crate::keys::NewCredential;

pub use circleci::CircleCiWriter;
pub use error::LocationError;
pub use gitlab::GitLabWriter;
pub use k8s::K8sWriter;
pub use propagate::{destinations, Propagator};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ─── Records ─────────────────────────────────────────────────────────────────

/// What one successful write changed. Logged, never used for control flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatedLocation {
    pub location_type: &'static str,
    pub location_id: String,
    pub key_names: Vec<String>,
}

/// One configured destination for an account's key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    CircleCi(CircleCiLocation),
    GitLab(GitLabLocation),
    K8s(K8sLocation),
}

impl Destination {
    pub fn kind(&self) -> &'static str {
        match self {
            Destination::CircleCi(_) => "CircleCI",
            Destination::GitLab(_) => "GitLab",
            Destination::K8s(_) => "K8s",
        }
    }

    /// Human-readable identifier of the destination within its kind.
    pub fn id(&self) -> String {
        match self {
            Destination::CircleCi(c) => c.project_slug.clone(),
            Destination::GitLab(g) => g.project.clone(),
            Destination::K8s(k) => format!("{}/{}", k.namespace, k.secret_name),
        }
    }
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Writes a new credential into one destination.
///
/// Implementations must treat "value already present" as success so that a
/// re-run after a partial propagation converges.
#[async_trait]
pub trait KeyWriter: Send + Sync {
    async fn write(
        &self,
        account: &str,
        key: &NewCredential,
        credentials: &Credentials,
    ) -> Result<UpdatedLocation, LocationError>;
}

/// Turns a destination descriptor into the writer that updates it.
pub trait WriterFactory: Send + Sync {
    fn writer(&self, destination: &Destination) -> Box<dyn KeyWriter>;
}

/// Production factory: HTTP writers sharing one client.
pub struct HttpWriterFactory {
    client: reqwest::Client,
}

impl HttpWriterFactory {
    pub fn new() -> Result<Self, LocationError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client })
    }
}

impl WriterFactory for HttpWriterFactory {
    fn writer(&self, destination: &Destination) -> Box<dyn KeyWriter> {
        match destination {
            Destination::CircleCi(c) => Box::new(CircleCiWriter::new(self.client.clone(), c.clone())),
            Destination::GitLab(g) => Box::new(GitLabWriter::new(self.client.clone(), g.clone())),
            Destination::K8s(k) => Box::new(K8sWriter::new(self.client.clone(), k.clone())),
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Default variable name for the secret half of a credential.
pub(crate) fn default_secret_name(provider: &str) -> &'static str {
    match provider {
        "aws" => "AWS_SECRET_ACCESS_KEY",
        _ => "GCLOUD_SERVICE_KEY",
    }
}

/// Default variable name for the key id, for providers whose credentials
/// are an id/secret pair.
pub(crate) fn default_key_id_name(provider: &str) -> Option<&'static str> {
    match provider {
        "aws" => Some("AWS_ACCESS_KEY_ID"),
        _ => None,
    }
}

pub(crate) async fn check(
    response: reqwest::Response,
    location: &str,
) -> Result<reqwest::Response, LocationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(LocationError::Rejected {
        location: location.to_string(),
        status: status.as_u16(),
        body,
    })
}

// ─── Mocks for Testing ───────────────────────────────────────────────────────

/// Writers that record `write:<destination id>` into the shared event log
/// used by `keys::provider::mock`, optionally failing for chosen destinations.
#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::keys::provider::mock::EventLog;
    use std::collections::HashSet;

    pub struct MockWriter {
        kind: &'static str,
        label: String,
        events: EventLog,
        fail: bool,
    }

    #[async_trait]
    impl KeyWriter for MockWriter {
        async fn write(
            &self,
            _account: &str,
            key: &NewCredential,
            _credentials: &Credentials,
        ) -> Result<UpdatedLocation, LocationError> {
            self.events
                .lock()
                .unwrap()
                .push(format!("write:{}", self.label));
            if self.fail {
                return Err(LocationError::Rejected {
                    location: self.label.clone(),
                    status: 500,
                    body: "write refused".to_string(),
                });
            }
            Ok(UpdatedLocation {
                location_type: self.kind,
                location_id: self.label.clone(),
                key_names: vec![key.key_id.clone()],
            })
        }
    }

    #[derive(Default)]
    pub struct MockWriterFactory {
        events: EventLog,
        failing: HashSet<String>,
    }

    impl MockWriterFactory {
        pub fn new(events: EventLog) -> Self {
            Self {
                events,
                failing: HashSet::new(),
            }
        }

        /// Make writes to the destination with this id fail.
        pub fn failing(mut self, destination_id: &str) -> Self {
            self.failing.insert(destination_id.to_string());
            self
        }
    }

    impl WriterFactory for MockWriterFactory {
        fn writer(&self, destination: &Destination) -> Box<dyn KeyWriter> {
            let label = destination.id();
            Box::new(MockWriter {
                kind: destination.kind(),
                fail: self.failing.contains(&label),
                label,
                events: self.events.clone(),
            })
        }
    }

    pub fn circleci(slug: &str) -> CircleCiLocation {
        CircleCiLocation {
            project_slug: slug.to_string(),
            key_env_var: None,
            key_id_env_var: None,
        }
    }

    pub fn gitlab(project: &str) -> GitLabLocation {
        GitLabLocation {
            project: project.to_string(),
            key_variable: None,
            key_id_variable: None,
            base_url: None,
        }
    }

    pub fn k8s(namespace: &str, secret_name: &str) -> K8sLocation {
        K8sLocation {
            server: "https://k8s.test".to_string(),
            namespace: namespace.to_string(),
            secret_name: secret_name.to_string(),
            data_key: None,
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
