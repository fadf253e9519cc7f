// Keyrotator - CircleCI location writer
//
// Upserts project environment variables through the CircleCI v2 API. POSTing
// an existing variable name replaces its value.

use async_trait::async_trait;
use serde_json::json;

use crate::config::{CircleCiLocation, Credentials};
use crate::keys::NewCredential;

use super::{check, default_key_id_name, default_secret_name, KeyWriter, LocationError, UpdatedLocation};

const CIRCLECI_BASE_URL: &str = "https://circleci.com";

pub struct CircleCiWriter {
    client: reqwest::Client,
    base_url: String,
    location: CircleCiLocation,
}

impl CircleCiWriter {
    pub fn new(client: reqwest::Client, location: CircleCiLocation) -> Self {
        Self {
            client,
            base_url: CIRCLECI_BASE_URL.to_string(),
            location,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn put_env_var(&self, token: &str, name: &str, value: &str) -> Result<(), LocationError> {
        let url = format!(
            "{}/api/v2/project/{}/envvar",
            self.base_url, self.location.project_slug
        );
        let response = self
            .client
            .post(url)
            .header("Circle-Token", token)
            .json(&json!({ "name": name, "value": value }))
            .send()
            .await?;
        check(response, &self.location.project_slug).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyWriter for CircleCiWriter {
    async fn write(
        &self,
        _account: &str,
        key: &NewCredential,
        credentials: &Credentials,
    ) -> Result<UpdatedLocation, LocationError> {
        let token = credentials
            .circleci_api_token
            .as_deref()
            .ok_or(LocationError::MissingCredential("circleci_api_token"))?;

        let mut key_names = Vec::new();

        let id_var = self
            .location
            .key_id_env_var
            .as_deref()
            .or_else(|| default_key_id_name(&key.provider));
        if let Some(id_var) = id_var {
            self.put_env_var(token, id_var, &key.key_id).await?;
            key_names.push(id_var.to_string());
        }

        let secret_var = self
            .location
            .key_env_var
            .as_deref()
            .unwrap_or_else(|| default_secret_name(&key.provider));
        self.put_env_var(token, secret_var, key.secret()).await?;
        key_names.push(secret_var.to_string());

        Ok(UpdatedLocation {
            location_type: "CircleCI",
            location_id: self.location.project_slug.clone(),
            key_names,
        })
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
