// Keyrotator - Kubernetes location writer
//
// Merge-patches an existing Secret so that only the rotated entries change.
// The Secret must already exist; creating it is left to whoever owns the
// namespace.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::header::CONTENT_TYPE;
use serde_json::{json, Map, Value};

use crate::config::{Credentials, K8sLocation};
use crate::keys::NewCredential;

use super::{check, default_key_id_name, default_secret_name, KeyWriter, LocationError, UpdatedLocation};

const MERGE_PATCH: &str = "application/merge-patch+json";

pub struct K8sWriter {
    client: reqwest::Client,
    location: K8sLocation,
}

impl K8sWriter {
    pub fn new(client: reqwest::Client, location: K8sLocation) -> Self {
        Self { client, location }
    }

    fn secret_url(&self) -> String {
        format!(
            "{}/api/v1/namespaces/{}/secrets/{}",
            self.location.server.trim_end_matches('/'),
            self.location.namespace,
            self.location.secret_name
        )
    }

    fn location_id(&self) -> String {
        format!("{}/{}", self.location.namespace, self.location.secret_name)
    }
}

#[async_trait]
impl KeyWriter for K8sWriter {
    async fn write(
        &self,
        _account: &str,
        key: &NewCredential,
        credentials: &Credentials,
    ) -> Result<UpdatedLocation, LocationError> {
        let token = credentials
            .kube_token
            .as_deref()
            .ok_or(LocationError::MissingCredential("kube_token"))?;

        let mut data = Map::new();
        if let Some(id_key) = default_key_id_name(&key.provider) {
            data.insert(id_key.to_string(), Value::String(STANDARD.encode(&key.key_id)));
        }
        let secret_key = self
            .location
            .data_key
            .as_deref()
            .unwrap_or_else(|| default_secret_name(&key.provider));
        data.insert(secret_key.to_string(), Value::String(STANDARD.encode(key.secret())));

        let key_names: Vec<String> = data.keys().cloned().collect();
        let patch = json!({ "data": data });

        let response = self
            .client
            .patch(self.secret_url())
            .bearer_auth(token)
            .header(CONTENT_TYPE, MERGE_PATCH)
            .body(patch.to_string())
            .send()
            .await?;
        check(response, &self.location_id()).await?;

        Ok(UpdatedLocation {
            location_type: "K8s",
            location_id: self.location_id(),
            key_names,
        })
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
