// Keyrotator - Configuration models
//
// SECURITY: `Credentials` holds API tokens for the location writers. Its
// Debug implementation never prints them.

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

use crate::keys::ProviderRef;

/// Rotation age threshold used when neither the config file nor the
/// account's key locations set one (30 days).
pub const DEFAULT_ROTATION_AGE_THRESHOLD_MINS: u32 = 43_200;

/// Top-level run configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// When false the run only observes (reports key ages) and never rotates.
    pub rotation_mode: bool,
    pub default_rotation_age_threshold_mins: u32,
    /// Whether AWS keys belonging to human IAM users ("first.last") are considered.
    pub include_aws_user_keys: bool,
    pub include_inactive_keys: bool,
    pub cloud_providers: Vec<CloudProvider>,
    pub account_filter: AccountFilter,
    pub account_key_locations: Vec<KeyLocations>,
    pub credentials: Credentials,
    pub datadog: Datadog,
    /// Location of the phase journal database. Defaults to the platform data dir.
    pub journal_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rotation_mode: false,
            default_rotation_age_threshold_mins: DEFAULT_ROTATION_AGE_THRESHOLD_MINS,
            include_aws_user_keys: false,
            include_inactive_keys: false,
            cloud_providers: Vec::new(),
            account_filter: AccountFilter::default(),
            account_key_locations: Vec::new(),
            credentials: Credentials::default(),
            datadog: Datadog::default(),
            journal_path: None,
        }
    }
}

/// A provider/project to discover keys in, plus the account this process
/// itself runs as there (its key is rotated last).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CloudProvider {
    pub name: String,
    #[serde(default)]
    pub project: String,
    #[serde(default, rename = "self")]
    pub self_account: String,
}

/// Account allow/deny list. `mode` is "include" or "exclude"; anything else
/// fails at filter time.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccountFilter {
    pub mode: String,
    pub accounts: Vec<ProviderServiceAccounts>,
}

impl Default for AccountFilter {
    fn default() -> Self {
        Self {
            mode: "exclude".to_string(),
            accounts: Vec::new(),
        }
    }
}

/// Accounts listed in the filter for one provider/project.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderServiceAccounts {
    pub provider: ProviderRef,
    #[serde(default)]
    pub accounts: Vec<String>,
}

/// Where the key of one account must be written after rotation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeyLocations {
    pub service_account_name: String,
    /// Per-account threshold override. Zero means "use the default".
    pub rotation_age_threshold_mins: u32,
    pub circleci: Vec<CircleCiLocation>,
    pub gitlab: Option<GitLabLocation>,
    pub k8s: Vec<K8sLocation>,
}

/// A CircleCI project environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CircleCiLocation {
    /// Project slug, e.g. "gh/my-org/my-repo".
    pub project_slug: String,
    #[serde(default)]
    pub key_env_var: Option<String>,
    #[serde(default)]
    pub key_id_env_var: Option<String>,
}

/// A GitLab project CI/CD variable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitLabLocation {
    /// Numeric project id or "group/project" path.
    pub project: String,
    #[serde(default)]
    pub key_variable: Option<String>,
    #[serde(default)]
    pub key_id_variable: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// A Kubernetes Secret entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct K8sLocation {
    /// API server URL, e.g. "https://10.0.0.1:6443".
    pub server: String,
    pub namespace: String,
    pub secret_name: String,
    #[serde(default)]
    pub data_key: Option<String>,
}

/// Datadog metric settings for observe-only runs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Datadog {
    pub metric_name: String,
    pub metric_team: String,
    pub metric_env: String,
}

impl Default for Datadog {
    fn default() -> Self {
        Self {
            metric_name: "cloud_key_age".to_string(),
            metric_team: String::new(),
            metric_env: String::new(),
        }
    }
}

/// Tokens used by location writers and the metrics client.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub circleci_api_token: Option<String>,
    pub gitlab_token: Option<String>,
    pub kube_token: Option<String>,
    pub datadog_api_key: Option<String>,
}

/// Custom Debug that only reveals which tokens are present.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mask(token: &Option<String>) -> &'static str {
            if token.is_some() {
                "[REDACTED]"
            } else {
                "<unset>"
            }
        }
        f.debug_struct("Credentials")
            .field("circleci_api_token", &mask(&self.circleci_api_token))
            .field("gitlab_token", &mask(&self.gitlab_token))
            .field("kube_token", &mask(&self.kube_token))
            .field("datadog_api_key", &mask(&self.datadog_api_key))
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_tokens() {
        let creds = Credentials {
            circleci_api_token: Some("cci-token-123".to_string()),
            gitlab_token: None,
            kube_token: Some("kube-token-456".to_string()),
            datadog_api_key: None,
        };

        let debug_output = format!("{:?}", creds);
        assert!(!debug_output.contains("cci-token-123"));
        assert!(!debug_output.contains("kube-token-456"));
        assert!(debug_output.contains("<unset>"));
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert!(!config.rotation_mode);
        assert_eq!(
            config.default_rotation_age_threshold_mins,
            DEFAULT_ROTATION_AGE_THRESHOLD_MINS
        );
        assert_eq!(config.account_filter.mode, "exclude");
        assert!(config.account_filter.accounts.is_empty());
    }
}
