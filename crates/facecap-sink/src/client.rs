//! Ingestion endpoint HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use facecap_models::CapturePayload;
use reqwest::Client;
use tracing::{debug, info};

use crate::error::{SinkError, SinkResult};
use crate::types::SinkResponse;

/// Default ingestion endpoint.
pub const DEFAULT_SINK_URL: &str = "http://localhost:5000/save-base64";

/// Destination for encoded captures.
#[async_trait]
pub trait PayloadSink: Send + Sync {
    /// Submit one payload. Called once per capture attempt, never retried.
    async fn submit(&self, payload: &CapturePayload) -> SinkResult<SinkResponse>;
}

/// Configuration for the sink client.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Full URL of the ingestion endpoint
    pub url: String,
    /// Request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SINK_URL.to_string(),
            timeout: None,
        }
    }
}

impl SinkConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("SINK_URL").unwrap_or_else(|_| DEFAULT_SINK_URL.to_string()),
            timeout: std::env::var("SINK_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs),
        }
    }
}

/// HTTP client for the ingestion endpoint.
#[derive(Debug, Clone)]
pub struct SinkClient {
    http: Client,
    config: SinkConfig,
}

impl SinkClient {
    /// Create a new sink client.
    pub fn new(config: SinkConfig) -> SinkResult<Self> {
        if config.url.trim().is_empty() {
            return Err(SinkError::Config("sink URL is empty".to_string()));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(SinkError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> SinkResult<Self> {
        Self::new(SinkConfig::from_env())
    }

    /// Endpoint URL.
    pub fn url(&self) -> &str {
        &self.config.url
    }

    fn map_send_error(&self, e: reqwest::Error) -> SinkError {
        match self.config.timeout {
            Some(timeout) if e.is_timeout() => SinkError::Timeout(timeout.as_secs()),
            _ => SinkError::Network(e),
        }
    }
}

#[async_trait]
impl PayloadSink for SinkClient {
    async fn submit(&self, payload: &CapturePayload) -> SinkResult<SinkResponse> {
        debug!(
            url = %self.config.url,
            chars = payload.image_len(),
            "Submitting capture payload"
        );

        let response = self
            .http
            .post(&self.config.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        let json: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| SinkError::InvalidResponse(format!("expected JSON body: {}", e)))?;

        info!(status = status.as_u16(), "Sink response: {}", json);
        Ok(SinkResponse(json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payload() -> CapturePayload {
        CapturePayload {
            image: "aGVsbG8=".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
        }
    }

    async fn client_for(server: &MockServer) -> SinkClient {
        SinkClient::new(SinkConfig {
            url: format!("{}/save-base64", server.uri()),
            timeout: Some(Duration::from_secs(5)),
        })
        .unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = SinkConfig::default();
        assert_eq!(config.url, DEFAULT_SINK_URL);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_empty_url_rejected() {
        let err = SinkClient::new(SinkConfig {
            url: "  ".to_string(),
            timeout: None,
        })
        .unwrap_err();
        assert!(matches!(err, SinkError::Config(_)));
    }

    #[tokio::test]
    async fn test_submit_posts_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/save-base64"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server).await.submit(&payload()).await.unwrap();
        assert_eq!(response.as_json()["ok"], true);

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["image"], "aGVsbG8=");
        assert_eq!(body["timestamp"], "2024-05-01T10:00:00.000Z");
    }

    #[tokio::test]
    async fn test_server_error_is_request_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client_for(&server).await.submit(&payload()).await.unwrap_err();
        assert!(matches!(err, SinkError::RequestFailed { status: 500, .. }));
        assert_eq!(err.http_status(), Some(500));
    }

    #[tokio::test]
    async fn test_non_json_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("saved"))
            .mount(&server)
            .await;

        let err = client_for(&server).await.submit(&payload()).await.unwrap_err();
        assert!(matches!(err, SinkError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_no_retry_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        assert!(client_for(&server).await.submit(&payload()).await.is_err());
        // MockServer verifies the single expected call on drop
    }

    #[tokio::test]
    async fn test_slow_sink_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = SinkClient::new(SinkConfig {
            url: format!("{}/save-base64", server.uri()),
            timeout: Some(Duration::from_millis(200)),
        })
        .unwrap();

        let err = client.submit(&payload()).await.unwrap_err();
        assert!(matches!(err, SinkError::Timeout(_)), "{err:?}");
    }
}
