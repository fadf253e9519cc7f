// Keyrotator - GCP Key Provider
//
// Talks to the IAM REST API to list, create and delete user-managed service
// account keys. Authentication is a bearer token taken from
// GOOGLE_OAUTH_ACCESS_TOKEN (e.g. `gcloud auth print-access-token`).

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{Key, KeyError, KeyProvider, NewCredential, ProviderRef};

const IAM_BASE_URL: &str = "https://iam.googleapis.com/v1";
const TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceAccountList {
    #[serde(default)]
    accounts: Vec<ServiceAccount>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceAccount {
    email: String,
    #[serde(default)]
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct KeyList {
    #[serde(default)]
    keys: Vec<ServiceAccountKey>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceAccountKey {
    name: String,
    valid_after_time: Option<String>,
    #[serde(default)]
    disabled: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedKey {
    name: String,
    private_key_data: String,
}

// ─── Provider ────────────────────────────────────────────────────────────────

pub struct GcpKeyProvider {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl GcpKeyProvider {
    /// Build a provider from the GOOGLE_OAUTH_ACCESS_TOKEN environment variable.
    pub fn from_env() -> Result<Self, KeyError> {
        let token = std::env::var(TOKEN_ENV).map_err(|_| KeyError::MissingToken(TOKEN_ENV))?;
        Self::new(token)
    }

    pub fn new(token: String) -> Result<Self, KeyError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: IAM_BASE_URL.to_string(),
            token,
        })
    }

    /// Point the provider at a different API root (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn keys_url(&self, project: &str, email: &str) -> String {
        format!(
            "{}/projects/{}/serviceAccounts/{}/keys",
            self.base_url, project, email
        )
    }

    async fn service_accounts(&self, project: &str) -> Result<Vec<ServiceAccount>, KeyError> {
        let url = format!("{}/projects/{}/serviceAccounts", self.base_url, project);
        let mut accounts = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.client.get(&url).bearer_auth(&self.token);
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token)]);
            }
            let page: ServiceAccountList = check(request.send().await?, "list service accounts")
                .await?
                .json()
                .await?;
            accounts.extend(page.accounts);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        Ok(accounts)
    }
}

#[async_trait]
impl KeyProvider for GcpKeyProvider {
    async fn list_keys(
        &self,
        provider: &ProviderRef,
        include_inactive: bool,
    ) -> Result<Vec<Key>, KeyError> {
        let now = Utc::now();
        let mut keys = Vec::new();

        for account in self.service_accounts(&provider.project).await? {
            let response = self
                .client
                .get(self.keys_url(&provider.project, &account.email))
                .query(&[("keyTypes", "USER_MANAGED")])
                .bearer_auth(&self.token)
                .send()
                .await?;
            let list: KeyList = check(response, "list keys").await?.json().await?;

            let short_name = account
                .email
                .split('@')
                .next()
                .unwrap_or(&account.email)
                .to_string();

            for sa_key in list.keys {
                if sa_key.disabled && !include_inactive {
                    continue;
                }
                let valid_after = sa_key.valid_after_time.as_deref().ok_or_else(|| {
                    KeyError::Malformed(format!("key {} has no validAfterTime", sa_key.name))
                })?;
                let created = DateTime::parse_from_rfc3339(valid_after)
                    .map_err(|e| KeyError::Malformed(format!("bad validAfterTime: {}", e)))?
                    .with_timezone(&Utc);

                keys.push(Key {
                    id: last_segment(&sa_key.name).to_string(),
                    provider: provider.clone(),
                    account: short_name.clone(),
                    full_account: account.email.clone(),
                    age_mins: (now - created).num_seconds() as f64 / 60.0,
                    status: (if sa_key.disabled { "INACTIVE" } else { "ACTIVE" }).to_string(),
                    name: if account.display_name.is_empty() {
                        short_name.clone()
                    } else {
                        account.display_name.clone()
                    },
                });
            }
        }

        tracing::debug!(provider = %provider, count = keys.len(), "Listed GCP keys");
        Ok(keys)
    }

    async fn create_key(&self, key: &Key) -> Result<NewCredential, KeyError> {
        let response = self
            .client
            .post(self.keys_url(&key.provider.project, &key.full_account))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "privateKeyType": "TYPE_GOOGLE_CREDENTIALS_FILE" }))
            .send()
            .await?;
        let created: CreatedKey = check(response, "create key").await?.json().await?;

        let decoded = STANDARD
            .decode(created.private_key_data.as_bytes())
            .map_err(|e| KeyError::Malformed(format!("privateKeyData is not base64: {}", e)))?;
        let secret = String::from_utf8(decoded)
            .map_err(|e| KeyError::Malformed(format!("privateKeyData is not UTF-8: {}", e)))?;

        Ok(NewCredential::new(
            key.provider.name.clone(),
            last_segment(&created.name),
            secret,
        ))
    }

    async fn delete_key(&self, key: &Key) -> Result<(), KeyError> {
        let url = format!(
            "{}/{}",
            self.keys_url(&key.provider.project, &key.full_account),
            key.id
        );
        let response = self
            .client
            .delete(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        check(response, "delete key").await?;
        Ok(())
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

async fn check(
    response: reqwest::Response,
    operation: &'static str,
) -> Result<reqwest::Response, KeyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(KeyError::Rejected {
        operation,
        status: status.as_u16(),
        body,
    })
}

/// `projects/p/serviceAccounts/sa@p.iam.gserviceaccount.com/keys/abc` -> `abc`
fn last_segment(resource_name: &str) -> &str {
    resource_name.rsplit('/').next().unwrap_or(resource_name)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const EMAIL: &str = "deployer@proj.iam.gserviceaccount.com";

    fn test_key() -> Key {
        Key {
            id: "oldkey".to_string(),
            provider: ProviderRef::new("gcp", "proj"),
            account: "deployer".to_string(),
            full_account: EMAIL.to_string(),
            age_mins: 100.0,
            status: "ACTIVE".to_string(),
            name: "deployer".to_string(),
        }
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment("projects/p/serviceAccounts/a/keys/abc"), "abc");
        assert_eq!(last_segment("abc"), "abc");
    }

    #[tokio::test]
    async fn test_list_keys_maps_accounts_and_skips_disabled() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects/proj/serviceAccounts"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accounts": [{ "email": EMAIL, "displayName": "Deployer" }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/projects/proj/serviceAccounts/{}/keys", EMAIL)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "keys": [
                    {
                        "name": format!("projects/proj/serviceAccounts/{}/keys/k1", EMAIL),
                        "validAfterTime": "2020-01-01T00:00:00Z"
                    },
                    {
                        "name": format!("projects/proj/serviceAccounts/{}/keys/k2", EMAIL),
                        "validAfterTime": "2020-01-01T00:00:00Z",
                        "disabled": true
                    }
                ]
            })))
            .mount(&server)
            .await;

        let provider = GcpKeyProvider::new("tok".to_string())
            .unwrap()
            .with_base_url(server.uri());
        let keys = provider
            .list_keys(&ProviderRef::new("gcp", "proj"), false)
            .await
            .unwrap();

        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].id, "k1");
        assert_eq!(keys[0].account, "deployer");
        assert_eq!(keys[0].full_account, EMAIL);
        assert_eq!(keys[0].name, "Deployer");
        assert!(keys[0].age_mins > 60.0 * 24.0 * 365.0);
    }

    #[tokio::test]
    async fn test_create_key_decodes_private_key_data() {
        let server = MockServer::start().await;
        let key_file = r#"{"type":"service_account"}"#;
        Mock::given(method("POST"))
            .and(path(format!("/projects/proj/serviceAccounts/{}/keys", EMAIL)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": format!("projects/proj/serviceAccounts/{}/keys/newkey", EMAIL),
                "privateKeyData": STANDARD.encode(key_file),
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = GcpKeyProvider::new("tok".to_string())
            .unwrap()
            .with_base_url(server.uri());
        let created = provider.create_key(&test_key()).await.unwrap();

        assert_eq!(created.key_id, "newkey");
        assert_eq!(created.provider, "gcp");
        assert_eq!(created.secret(), key_file);
    }

    #[tokio::test]
    async fn test_delete_key_surfaces_api_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(format!(
                "/projects/proj/serviceAccounts/{}/keys/oldkey",
                EMAIL
            )))
            .respond_with(ResponseTemplate::new(403).set_body_string("permission denied"))
            .mount(&server)
            .await;

        let provider = GcpKeyProvider::new("tok".to_string())
            .unwrap()
            .with_base_url(server.uri());
        let err = provider.delete_key(&test_key()).await.unwrap_err();

        match err {
            KeyError::Rejected { status, body, .. } => {
                assert_eq!(status, 403);
                assert_eq!(body, "permission denied");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
