//! Client for the upstream SpaceX data API
//!
//! One GET per collection, no pagination and no retries. The whole
//! collection arrives as a single JSON array of loosely-typed records.

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use clap::ValueEnum;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// External collections mirrored from the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Crew,
    Payloads,
    Launches,
}

impl Collection {
    /// Order in which a full sync runs. Launches go last so their crew and
    /// payload references can resolve.
    pub const SYNC_ORDER: [Collection; 3] =
        [Collection::Crew, Collection::Payloads, Collection::Launches];
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Collection::Crew => write!(f, "crew"),
            Collection::Payloads => write!(f, "payloads"),
            Collection::Launches => write!(f, "launches"),
        }
    }
}

/// Anything that can hand over the raw records of a collection
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch(&self, collection: Collection) -> Result<Vec<Value>>;
}

/// HTTP client for the upstream API
pub struct ApiClient {
    client: Client,
    config: ApiConfig,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// GET a URL and parse the body as a JSON array of records
    pub async fn fetch_url(&self, url: Url) -> Result<Vec<Value>> {
        debug!("Fetching: {}", url);

        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let parsed: Value = serde_json::from_str(&body)
            .map_err(|e| Error::Parse(format!("{} returned invalid JSON: {}", url, e)))?;

        match parsed {
            Value::Array(records) => {
                debug!("Fetched {} records from {}", records.len(), url);
                Ok(records)
            }
            other => Err(Error::Parse(format!(
                "{} returned a JSON {} instead of an array",
                url,
                json_kind(&other)
            ))),
        }
    }
}

#[async_trait]
impl RecordSource for ApiClient {
    async fn fetch(&self, collection: Collection) -> Result<Vec<Value>> {
        let url = self.config.collection_url(collection)?;
        self.fetch_url(url).await
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        let config = ApiConfig {
            base_url: server.uri(),
            timeout_secs: 5,
            ..Default::default()
        };
        ApiClient::new(&config).expect("client should build")
    }

    #[test]
    fn test_collection_names_and_sync_order() {
        let names: Vec<String> = Collection::SYNC_ORDER
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(names, vec!["crew", "payloads", "launches"]);
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host_is_network_error() {
        // Nothing listens on the discard port
        let config = ApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 5,
            ..Default::default()
        };
        let client = ApiClient::new(&config).expect("client should build");
        let err = client.fetch(Collection::Crew).await.unwrap_err();

        assert!(matches!(err, Error::Network(_)));
        assert!(!err.is_record_error());
    }

    #[tokio::test]
    async fn test_fetch_collection_returns_records() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/crew"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "crew_1", "name": "Robert Behnken"},
                {"id": "crew_2", "name": "Douglas Hurley"}
            ])))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let records = client.fetch(Collection::Crew).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["id"], "crew_1");
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v5/launches"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let err = client.fetch(Collection::Launches).await.unwrap_err();

        assert!(matches!(err, Error::HttpStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_fetch_invalid_json() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/payloads"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(b"<html>maintenance</html>".to_vec(), "text/html"),
            )
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let err = client.fetch(Collection::Payloads).await.unwrap_err();

        assert!(matches!(err, Error::Parse(_)));
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_array_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/crew"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"docs": []})))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let err = client.fetch(Collection::Crew).await.unwrap_err();

        match err {
            Error::Parse(msg) => assert!(msg.contains("object")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }
}
