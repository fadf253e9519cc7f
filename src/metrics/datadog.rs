// Keyrotator - Datadog key age metrics
//
// One series point per key, tagged so dashboards can group by team,
// environment, provider and account. The API key goes in a header rather
// than the query string so it never lands in request logs.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;

use crate::config::Datadog;
use crate::keys::Key;

use super::{KeyMetrics, MetricsError};

const DATADOG_BASE_URL: &str = "https://api.datadoghq.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct SeriesPayload<'a> {
    series: Vec<Series<'a>>,
}

#[derive(Debug, Serialize)]
struct Series<'a> {
    metric: &'a str,
    points: [(i64, f64); 1],
    #[serde(rename = "type")]
    kind: &'static str,
    tags: Vec<String>,
}

pub struct DatadogMetrics {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    settings: Datadog,
}

impl DatadogMetrics {
    pub fn new(api_key: String, settings: Datadog) -> Result<Self, MetricsError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: DATADOG_BASE_URL.to_string(),
            api_key,
            settings,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn series<'a>(&'a self, key: &Key, now: i64) -> Series<'a> {
        Series {
            metric: &self.settings.metric_name,
            points: [(now, (key.age_mins * 100.0).round() / 100.0)],
            kind: "count",
            tags: vec![
                format!("team:{}", self.settings.metric_team),
                format!("environment:{}", self.settings.metric_env),
                format!("key:{}", key.name),
                format!("provider:{}", key.provider.name),
                format!("status:{}", key.status),
                format!("account:{}", key.account),
            ],
        }
    }
}

#[async_trait]
impl KeyMetrics for DatadogMetrics {
    async fn post_key_ages(&self, keys: &[Key]) -> Result<(), MetricsError> {
        if keys.is_empty() {
            return Ok(());
        }
        let now = Utc::now().timestamp();
        let payload = SeriesPayload {
            series: keys.iter().map(|k| self.series(k, now)).collect(),
        };

        let response = self
            .client
            .post(format!("{}/api/v1/series", self.base_url))
            .header("DD-API-KEY", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::ACCEPTED {
            return Err(MetricsError::Rejected {
                status: status.as_u16(),
            });
        }
        tracing::info!(count = keys.len(), metric = %self.settings.metric_name, "Posted key age metrics");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::provider::mock::key;
    use serde_json::Value;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings() -> Datadog {
        Datadog {
            metric_name: "cloud_key_age".to_string(),
            metric_team: "platform".to_string(),
            metric_env: "prod".to_string(),
        }
    }

    #[tokio::test]
    async fn test_posts_one_point_per_key_with_tags() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/series"))
            .and(header("DD-API-KEY", "dd-key"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let metrics = DatadogMetrics::new("dd-key".to_string(), settings())
            .unwrap()
            .with_base_url(server.uri());
        let keys = vec![
            key("k1", "gcp", "proj", "sa-1", 123.456),
            key("k2", "gcp", "proj", "sa-2", 10.0),
        ];
        metrics.post_key_ages(&keys).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        let series = body["series"].as_array().unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0]["metric"], "cloud_key_age");
        assert_eq!(series[0]["type"], "count");
        assert_eq!(series[0]["points"][0][1], 123.46);

        let tags: Vec<&str> = series[0]["tags"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t.as_str().unwrap())
            .collect();
        assert_eq!(
            tags,
            [
                "team:platform",
                "environment:prod",
                "key:sa-1",
                "provider:gcp",
                "status:ACTIVE",
                "account:sa-1"
            ]
        );
    }

    #[tokio::test]
    async fn test_non_202_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let metrics = DatadogMetrics::new("bad".to_string(), settings())
            .unwrap()
            .with_base_url(server.uri());
        let err = metrics
            .post_key_ages(&[key("k1", "gcp", "proj", "sa-1", 1.0)])
            .await
            .unwrap_err();
        assert!(matches!(err, MetricsError::Rejected { status: 403 }));
    }

    #[tokio::test]
    async fn test_no_keys_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202))
            .expect(0)
            .mount(&server)
            .await;

        let metrics = DatadogMetrics::new("dd-key".to_string(), settings())
            .unwrap()
            .with_base_url(server.uri());
        metrics.post_key_ages(&[]).await.unwrap();
    }
}
