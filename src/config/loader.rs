// Keyrotator - Configuration loading
//
// Reads the JSON config file, then lets environment variables override the
// tokens so they never have to be written to disk.

use std::fs;
use std::path::Path;

use super::{Config, ConfigError};

const ENV_OVERRIDES: &[&str] = &[
    "CIRCLECI_API_TOKEN",
    "GITLAB_TOKEN",
    "KUBE_TOKEN",
    "DATADOG_API_KEY",
];

impl Config {
    /// Load the config file at `path` and apply environment overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: Config =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;

        config.apply_env_overrides(|name| std::env::var(name).ok());

        tracing::debug!(
            path = %path.display(),
            providers = config.cloud_providers.len(),
            accounts = config.account_key_locations.len(),
            rotation_mode = config.rotation_mode,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Override credential tokens from `lookup` (normally the process environment).
    /// Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for name in ENV_OVERRIDES {
            let Some(value) = lookup(name).filter(|v| !v.is_empty()) else {
                continue;
            };
            let slot = match *name {
                "CIRCLECI_API_TOKEN" => &mut self.credentials.circleci_api_token,
                "GITLAB_TOKEN" => &mut self.credentials.gitlab_token,
                "KUBE_TOKEN" => &mut self.credentials.kube_token,
                _ => &mut self.credentials.datadog_api_key,
            };
            *slot = Some(value);
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_parsing() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
                "rotation_mode": true,
                "default_rotation_age_threshold_mins": 1440,
                "cloud_providers": [
                    {{ "name": "gcp", "project": "my-project", "self": "key-rotator" }}
                ],
                "account_filter": {{
                    "mode": "include",
                    "accounts": [
                        {{ "provider": {{ "name": "gcp", "project": "my-project" }},
                           "accounts": ["ci-deployer"] }}
                    ]
                }},
                "account_key_locations": [
                    {{
                        "service_account_name": "ci-deployer",
                        "rotation_age_threshold_mins": 60,
                        "circleci": [{{ "project_slug": "gh/org/repo", "key_env_var": "GCLOUD_KEY" }}],
                        "gitlab": {{ "project": "org/repo" }},
                        "k8s": [{{ "server": "https://k8s.local", "namespace": "ci", "secret_name": "deployer" }}]
                    }}
                ],
                "credentials": {{ "circleci_api_token": "from-file" }}
            }}"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert!(config.rotation_mode);
        assert_eq!(config.default_rotation_age_threshold_mins, 1440);
        assert_eq!(config.cloud_providers[0].self_account, "key-rotator");
        assert_eq!(config.account_filter.mode, "include");
        assert_eq!(config.account_filter.accounts[0].accounts, vec!["ci-deployer"]);

        let locations = &config.account_key_locations[0];
        assert_eq!(locations.rotation_age_threshold_mins, 60);
        assert_eq!(locations.circleci[0].project_slug, "gh/org/repo");
        assert_eq!(locations.gitlab.as_ref().unwrap().project, "org/repo");
        assert_eq!(locations.k8s[0].secret_name, "deployer");
        assert!(!config.include_aws_user_keys);
    }

    #[test]
    fn test_config_missing_file() {
        let result = Config::from_file(Path::new("/nonexistent/path/config.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_config_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{invalid json").unwrap();

        let result = Config::from_file(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_env_overrides_replace_file_tokens() {
        let mut config = Config::default();
        config.credentials.circleci_api_token = Some("from-file".to_string());

        config.apply_env_overrides(|name| match name {
            "CIRCLECI_API_TOKEN" => Some("from-env".to_string()),
            "KUBE_TOKEN" => Some(String::new()),
            "DATADOG_API_KEY" => Some("dd-key".to_string()),
            _ => None,
        });

        assert_eq!(config.credentials.circleci_api_token.as_deref(), Some("from-env"));
        assert_eq!(config.credentials.kube_token, None, "empty values are ignored");
        assert_eq!(config.credentials.gitlab_token, None);
        assert_eq!(config.credentials.datadog_api_key.as_deref(), Some("dd-key"));
    }
}
