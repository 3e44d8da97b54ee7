//! Rentman API HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::dto::{MediaResponse, OneOrMany};
use crate::domain::entities::{MediaRecord, MediaSelector, Secret};
use crate::domain::errors::UpstreamError;
use crate::domain::ports::MediaSourcePort;
use crate::infrastructure::config::UpstreamConfig;

const MEDIA_PATH: &str = "/propertymedia.php";
const TOKEN_HEADER: &str = "token";

/// Exponential backoff schedule for transient upstream failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on every further retry.
    pub base_delay: Duration,
    /// Upper bound for a single delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Returns the delay to wait after failed attempt number `attempt` (zero-based).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base_delay = self.base_delay.as_millis() as u64;
        let max_delay = self.max_delay.as_millis() as u64;

        let exponential_delay = base_delay.saturating_mul(2_u64.saturating_pow(attempt.min(16)));
        Duration::from_millis(exponential_delay.min(max_delay))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(8),
        }
    }
}

/// Rentman listing API client.
pub struct RentmanClient {
    client: Client,
    base_url: String,
    token: Secret,
    retry: RetryPolicy,
    request_timeout: Duration,
}

impl std::fmt::Debug for RentmanClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RentmanClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl RentmanClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let request_timeout = Duration::from_secs(config.request_timeout_secs);
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(request_timeout)
            .build()
            .map_err(|e| UpstreamError::network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            retry: config.retry_policy(),
            request_timeout,
        })
    }

    /// GETs `path` and decodes the JSON body, retrying transient failures.
    ///
    /// Returns `Ok(None)` for a 404.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, UpstreamError> {
        let mut attempt = 0;
        loop {
            match self.get_json_once(path, query, attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        path,
                        attempt = attempt + 1,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "Upstream request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(path, code = e.code(), status = ?e.status(), error = %e, "Upstream request failed");
                    return Err(e);
                }
            }
        }
    }

    async fn get_json_once<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        attempt: u32,
    ) -> Result<Option<T>, UpstreamError> {
        let url = format!("{}{path}", self.base_url);

        debug!(method = "GET", path, attempt = attempt + 1, "Upstream request");

        let response = self
            .client
            .get(&url)
            .header(TOKEN_HEADER, self.token.expose())
            .query(query)
            .send()
            .await
            .map_err(|e| self.map_send_error(&e))?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .ok()
                .filter(|body| !body.trim().is_empty())
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string());

            return Err(if status.is_server_error() {
                UpstreamError::Server {
                    status: status.as_u16(),
                    attempts: attempt + 1,
                    message,
                }
            } else {
                UpstreamError::Client {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| UpstreamError::invalid_response(format!("failed to parse response: {e}")))
    }

    fn map_send_error(&self, e: &reqwest::Error) -> UpstreamError {
        if e.is_timeout() {
            UpstreamError::Timeout {
                after_ms: u64::try_from(self.request_timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else if e.is_connect() {
            UpstreamError::network("failed to connect to upstream")
        } else {
            UpstreamError::network(e.to_string())
        }
    }
}

#[async_trait]
impl MediaSourcePort for RentmanClient {
    async fn fetch_media(&self, selector: &MediaSelector) -> Result<Vec<MediaRecord>, UpstreamError> {
        let mut query = Vec::with_capacity(2);
        if let Some(filename) = selector.filename() {
            query.push(("filename", filename));
        }
        if let Some(property_ref) = selector.property_ref() {
            query.push(("propref", property_ref));
        }

        let Some(body) = self
            .get_json::<OneOrMany<MediaResponse>>(MEDIA_PATH, &query)
            .await?
        else {
            return Ok(Vec::new());
        };

        // One undecodable record must not hide the rest of the listing.
        let records: Vec<MediaRecord> = body
            .into_vec()
            .into_iter()
            .filter_map(|dto| {
                let filename = dto.filename.clone();
                MediaRecord::try_from(dto)
                    .inspect_err(|e| warn!(filename = %filename, error = %e, "Skipping media record"))
                    .ok()
            })
            .collect();

        debug!(
            filename = ?selector.filename(),
            propref = ?selector.property_ref(),
            count = records.len(),
            "Fetched media records"
        );

        Ok(records)
    }

    async fn health_check(&self) -> Result<(), UpstreamError> {
        let url = format!("{}{MEDIA_PATH}", self.base_url);

        debug!("Performing upstream health check");

        let response = self
            .client
            .head(&url)
            .header(TOKEN_HEADER, self.token.expose())
            .send()
            .await
            .map_err(|e| self.map_send_error(&e))?;

        let status = response.status();
        if status.is_server_error() {
            Err(UpstreamError::Server {
                status: status.as_u16(),
                attempts: 1,
                message: format!("upstream returned {status}"),
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> UpstreamConfig {
        UpstreamConfig {
            base_url: base_url.to_string(),
            token: Secret::new("test-token-0123456789"),
            max_retries: 2,
            retry_base_delay_ms: 1,
            retry_max_delay_ms: 4,
            request_timeout_secs: 5,
            fetch_timeout_secs: 5,
        }
    }

    fn media_body() -> serde_json::Value {
        serde_json::json!([{
            "filename": "prop1.jpg",
            "caption": "Front",
            "sortorder": "1",
            "propref": "P1",
            "base64data": "/9j/4A=="
        }])
    }

    #[test]
    fn test_backoff_delay() {
        let policy = RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
        };

        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for(3), Duration::from_millis(500));
        assert_eq!(policy.delay_for(100), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_fetch_by_filename() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/propertymedia.php"))
            .and(query_param("filename", "prop1.jpg"))
            .and(header("token", "test-token-0123456789"))
            .respond_with(ResponseTemplate::new(200).set_body_json(media_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = RentmanClient::new(&config(&server.uri())).unwrap();
        let selector = MediaSelector::by_filename("prop1.jpg").unwrap();
        let records = client.fetch_media(&selector).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].property_ref.as_deref(), Some("P1"));
        assert_eq!(records[0].payload.as_ref().map(|b| b.len()), Some(4));
    }

    #[tokio::test]
    async fn test_undecodable_record_is_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/propertymedia.php"))
            .and(query_param("propref", "P1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "filename": "prop1.jpg", "sortorder": 1, "propref": "P1", "base64data": "/9j/4A==" },
                { "filename": "prop1_bad.jpg", "sortorder": 2, "propref": "P1", "base64data": "!!not base64!!" }
            ])))
            .mount(&server)
            .await;

        let client = RentmanClient::new(&config(&server.uri())).unwrap();
        let selector = MediaSelector::by_property("P1").unwrap();
        let records = client.fetch_media(&selector).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].filename, "prop1.jpg");
    }

    #[tokio::test]
    async fn test_retries_server_errors_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(media_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = RentmanClient::new(&config(&server.uri())).unwrap();
        let selector = MediaSelector::by_property("P1").unwrap();
        let records = client.fetch_media(&selector).await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .expect(3)
            .mount(&server)
            .await;

        let client = RentmanClient::new(&config(&server.uri())).unwrap();
        let selector = MediaSelector::by_property("P1").unwrap();

        match client.fetch_media(&selector).await {
            Err(UpstreamError::Server {
                status, attempts, ..
            }) => {
                assert_eq!(status, 502);
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .expect(1)
            .mount(&server)
            .await;

        let client = RentmanClient::new(&config(&server.uri())).unwrap();
        let selector = MediaSelector::by_property("P1").unwrap();
        let err = client.fetch_media(&selector).await.unwrap_err();

        assert_eq!(err.code(), "UPSTREAM_CLIENT");
        assert_eq!(err.status(), Some(401));
        assert!(err.to_string().contains("invalid token"));
    }

    #[tokio::test]
    async fn test_not_found_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = RentmanClient::new(&config(&server.uri())).unwrap();
        let selector = MediaSelector::by_filename("missing.jpg").unwrap();
        assert!(client.fetch_media(&selector).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_network_error() {
        let client = RentmanClient::new(&config("http://127.0.0.1:9")).unwrap();
        let selector = MediaSelector::by_property("P1").unwrap();
        let err = client.fetch_media(&selector).await.unwrap_err();
        assert_eq!(err.code(), "UPSTREAM_NETWORK");
    }
}
