// Keyrotator - Configuration Module
//
// The JSON run configuration: providers, account filters, per-account key
// locations and the tokens the location writers authenticate with.

mod error;
mod loader;
mod models;

pub use error::ConfigError;
pub use models::{
    AccountFilter, CircleCiLocation, CloudProvider, Config, Credentials, Datadog, GitLabLocation,
    K8sLocation, KeyLocations, ProviderServiceAccounts, DEFAULT_ROTATION_AGE_THRESHOLD_MINS,
};
