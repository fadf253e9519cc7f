// Keyrotator - Metrics Module
//
// Observe-only runs report key ages instead of rotating.

mod datadog;
mod error;

use async_trait::async_trait;

use crate::keys::Key;

pub use datadog::DatadogMetrics;
pub use error::MetricsError;

/// Sink for key age reports.
#[async_trait]
pub trait KeyMetrics: Send + Sync {
    async fn post_key_ages(&self, keys: &[Key]) -> Result<(), MetricsError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Records the key ids of every report.
    #[derive(Default)]
    pub struct MockMetrics {
        pub posted: Mutex<Vec<Vec<String>>>,
        pub fail: bool,
    }

    #[async_trait]
    impl KeyMetrics for MockMetrics {
        async fn post_key_ages(&self, keys: &[Key]) -> Result<(), MetricsError> {
            self.posted
                .lock()
                .unwrap()
                .push(keys.iter().map(|k| k.id.clone()).collect());
            if self.fail {
                return Err(MetricsError::Rejected { status: 403 });
            }
            Ok(())
        }
    }
}
