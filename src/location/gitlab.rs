// Keyrotator - GitLab location writer
//
// Updates a project-level CI/CD variable. The variable is updated in place
// with PUT; a 404 means it does not exist yet and it is created with POST.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;

use crate::config::{Credentials, GitLabLocation};
use crate::keys::NewCredential;

use super::{check, default_key_id_name, default_secret_name, KeyWriter, LocationError, UpdatedLocation};

const GITLAB_BASE_URL: &str = "https://gitlab.com";

/// Shortest value GitLab accepts for a masked variable.
const MIN_MASKED_LEN: usize = 8;

/// GitLab rejects masking for short values and values containing
/// whitespace (e.g. a pretty-printed service account JSON file).
fn maskable(value: &str) -> bool {
    value.len() >= MIN_MASKED_LEN && !value.chars().any(char::is_whitespace)
}

pub struct GitLabWriter {
    client: reqwest::Client,
    location: GitLabLocation,
}

impl GitLabWriter {
    pub fn new(client: reqwest::Client, location: GitLabLocation) -> Self {
        Self { client, location }
    }

    fn project_url(&self) -> String {
        let base = self.location.base_url.as_deref().unwrap_or(GITLAB_BASE_URL);
        format!(
            "{}/api/v4/projects/{}/variables",
            base.trim_end_matches('/'),
            self.location.project.replace('/', "%2F")
        )
    }

    async fn upsert_variable(&self, token: &str, name: &str, value: &str) -> Result<(), LocationError> {
        let masked = maskable(value);
        if !masked {
            tracing::warn!(
                project = %self.location.project,
                variable = name,
                "Value cannot be masked by GitLab, writing it unmasked"
            );
        }

        let response = self
            .client
            .put(format!("{}/{}", self.project_url(), name))
            .header("PRIVATE-TOKEN", token)
            .json(&json!({ "value": value, "masked": masked }))
            .send()
            .await?;

        if response.status() != StatusCode::NOT_FOUND {
            check(response, &self.location.project).await?;
            return Ok(());
        }

        tracing::debug!(project = %self.location.project, variable = name, "Creating GitLab variable");
        let response = self
            .client
            .post(self.project_url())
            .header("PRIVATE-TOKEN", token)
            .json(&json!({ "key": name, "value": value, "masked": masked }))
            .send()
            .await?;
        check(response, &self.location.project).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyWriter for GitLabWriter {
    async fn write(
        &self,
        _account: &str,
        key: &NewCredential,
        credentials: &Credentials,
    ) -> Result<UpdatedLocation, LocationError> {
        let token = credentials
            .gitlab_token
            .as_deref()
            .ok_or(LocationError::MissingCredential("gitlab_token"))?;

        let mut key_names = Vec::new();

        let id_var = self
            .location
            .key_id_variable
            .as_deref()
            .or_else(|| default_key_id_name(&key.provider));
        if let Some(id_var) = id_var {
            self.upsert_variable(token, id_var, &key.key_id).await?;
            key_names.push(id_var.to_string());
        }

        let secret_var = self
            .location
            .key_variable
            .as_deref()
            .unwrap_or_else(|| default_secret_name(&key.provider));
        self.upsert_variable(token, secret_var, key.secret()).await?;
        key_names.push(secret_var.to_string());

        Ok(UpdatedLocation {
            location_type: "GitLab",
            location_id: self.location.project.clone(),
            key_names,
        })
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
