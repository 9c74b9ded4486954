//! Health store backed by a remote health gateway over HTTP.
//!
//! The gateway owns the actual health data and the permission prompt; this
//! client only forwards the four store capabilities as JSON requests.

use crate::config::RemoteSettings;
use crate::error::StoreError;
use crate::store::types::{MindfulRecord, RecordTypeHandle, RecordTypeId, SampleQuery, NO_LIMIT};
use crate::store::HealthStore;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Remote gateway configuration.
#[derive(Debug, Clone)]
pub struct RemoteStoreConfig {
    /// Gateway host (default: 127.0.0.1)
    pub host: String,
    /// Gateway port
    pub port: u16,
    /// Bearer authentication token
    pub token: String,
}

impl RemoteStoreConfig {
    /// Create a new gateway configuration.
    pub fn new(host: impl Into<String>, port: u16, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            token: token.into(),
        }
    }

    /// Get the full gateway URL.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Get the health check endpoint URL.
    pub fn health_url(&self) -> String {
        format!("{}/health", self.url())
    }

    /// Get the record type lookup URL for `id`.
    pub fn record_type_url(&self, id: &RecordTypeId) -> String {
        format!("{}/v1/record-types/{}", self.url(), id.as_str())
    }

    /// Get the authorization endpoint URL.
    pub fn authorizations_url(&self) -> String {
        format!("{}/v1/authorizations", self.url())
    }

    /// Get the sample query endpoint URL.
    pub fn samples_url(&self) -> String {
        format!("{}/v1/samples", self.url())
    }
}

impl From<&RemoteSettings> for RemoteStoreConfig {
    fn from(settings: &RemoteSettings) -> Self {
        Self::new(settings.host.clone(), settings.port, settings.token.clone())
    }
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    data_available: bool,
}

#[derive(Debug, Deserialize)]
struct RecordTypeResponse {
    handle: String,
}

#[derive(Debug, Serialize)]
struct AuthorizationRequest<'a> {
    read: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct AuthorizationResponse {
    granted: bool,
}

#[derive(Debug, Deserialize)]
struct SamplesResponse {
    samples: Option<Vec<MindfulRecord>>,
}

/// Query string parameters for a sample query.
///
/// A window bound at the edge of the representable range is open and is
/// left out, since it has no RFC 3339 form.
fn query_params(query: &SampleQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![("type", query.record_type.as_str().to_string())];

    if let Some(window) = &query.window {
        if window.start != DateTime::<Utc>::MIN_UTC {
            params.push((
                "start",
                window.start.to_rfc3339_opts(SecondsFormat::Millis, true),
            ));
        }
        if window.end != DateTime::<Utc>::MAX_UTC {
            params.push(("end", window.end.to_rfc3339_opts(SecondsFormat::Millis, true)));
        }
    }
    if query.limit != NO_LIMIT {
        params.push(("limit", query.limit.to_string()));
    }
    params
}

/// Gateway-backed health store.
pub struct RemoteStore {
    config: RemoteStoreConfig,
    client: reqwest::Client,
    client_id: String,
}

impl RemoteStore {
    /// Create a new remote store client.
    pub fn new(config: RemoteStoreConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| StoreError::Network(format!("Failed to create HTTP client: {e}")))?;

        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let client_id = format!(
            "mindful-{}-{}",
            hostname,
            &uuid::Uuid::new_v4().to_string()[..8]
        );

        Ok(Self {
            config,
            client,
            client_id,
        })
    }

    /// Get the client id sent with every request.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    fn get(&self, url: String) -> reqwest::RequestBuilder {
        self.authorized(self.client.get(url))
    }

    fn post(&self, url: String) -> reqwest::RequestBuilder {
        self.authorized(self.client.post(url))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.config.token)
            .header("X-Client-Id", &self.client_id)
    }

    async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(StoreError::Server {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl HealthStore for RemoteStore {
    async fn is_data_available(&self) -> bool {
        let response = match self.get(self.config.health_url()).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "health gateway unreachable");
                return false;
            }
        };

        match Self::expect_success(response).await {
            Ok(response) => response
                .json::<HealthResponse>()
                .await
                .map(|body| body.data_available)
                .unwrap_or(false),
            Err(e) => {
                tracing::warn!(error = %e, "health gateway check failed");
                false
            }
        }
    }

    async fn resolve_record_type(&self, id: &RecordTypeId) -> Option<RecordTypeHandle> {
        let response = self
            .get(self.config.record_type_url(id))
            .send()
            .await
            .ok()?;
        let response = Self::expect_success(response).await.ok()?;
        let body: RecordTypeResponse = response.json().await.ok()?;
        Some(RecordTypeHandle::new(body.handle))
    }

    async fn request_authorization(&self, read: &[RecordTypeHandle]) -> Result<bool, StoreError> {
        let request = AuthorizationRequest {
            read: read.iter().map(RecordTypeHandle::as_str).collect(),
        };

        let response = self
            .post(self.config.authorizations_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let body: AuthorizationResponse = Self::expect_success(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        Ok(body.granted)
    }

    async fn execute_query(
        &self,
        query: SampleQuery,
    ) -> Result<Option<Vec<MindfulRecord>>, StoreError> {
        let response = self
            .get(self.config.samples_url())
            .query(&query_params(&query))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let body: SamplesResponse = Self::expect_success(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        Ok(body.samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::Pipeline;
    use crate::core::window::TimeWindow;
    use crate::error::MindfulError;
    use chrono::TimeZone;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Canned gateway answer for requests whose path starts with a prefix.
    struct Route {
        prefix: &'static str,
        status: u16,
        body: &'static str,
    }

    fn route(prefix: &'static str, status: u16, body: &'static str) -> Route {
        Route {
            prefix,
            status,
            body,
        }
    }

    /// Serve `routes` on a local port. Returns the store config and the
    /// heads of every request received.
    async fn serve(routes: Vec<Route>) -> (RemoteStoreConfig, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = seen.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                answer(stream, &routes, &log).await;
            }
        });

        (RemoteStoreConfig::new("127.0.0.1", port, "test-token"), seen)
    }

    async fn answer(mut stream: TcpStream, routes: &[Route], seen: &Mutex<Vec<String>>) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let head_end = loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < head_end + content_length {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        let path = head.split_whitespace().nth(1).unwrap_or("").to_string();
        seen.lock().unwrap().push(head);

        let (status, body) = routes
            .iter()
            .find(|r| path.starts_with(r.prefix))
            .map(|r| (r.status, r.body))
            .unwrap_or((404, "not found"));
        let reason = match status {
            200 => "OK",
            404 => "Not Found",
            _ => "Internal Server Error",
        };
        let response = format!(
            "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        let _ = stream.shutdown().await;
    }

    fn gateway(samples: &'static str) -> Vec<Route> {
        vec![
            route("/health", 200, r#"{"data_available": true}"#),
            route("/v1/record-types/", 200, r#"{"handle": "remote:mindful"}"#),
            route("/v1/authorizations", 200, r#"{"granted": true}"#),
            route("/v1/samples", 200, samples),
        ]
    }

    #[test]
    fn test_remote_config_urls() {
        let config = RemoteStoreConfig::new("127.0.0.1", 8080, "test-token");
        assert_eq!(config.url(), "http://127.0.0.1:8080");
        assert_eq!(config.health_url(), "http://127.0.0.1:8080/health");
        assert_eq!(
            config.record_type_url(&RecordTypeId::mindful_session()),
            "http://127.0.0.1:8080/v1/record-types/mindful_session"
        );
        assert_eq!(config.samples_url(), "http://127.0.0.1:8080/v1/samples");
    }

    #[test]
    fn test_unbounded_query_params() {
        let query = SampleQuery::uncapped(RecordTypeHandle::new("hk:mindful"), None);
        assert_eq!(
            query_params(&query),
            vec![("type", "hk:mindful".to_string())]
        );
    }

    #[test]
    fn test_windowed_query_params() {
        let window = TimeWindow::new(
            Utc.with_ymd_and_hms(2024, 1, 22, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 22, 12, 0, 0).unwrap(),
        );
        let mut query = SampleQuery::uncapped(RecordTypeHandle::new("h"), Some(window));
        query.limit = 5;

        let params = query_params(&query);
        assert!(params.contains(&("start", "2024-01-22T00:00:00.000Z".to_string())));
        assert!(params.contains(&("end", "2024-01-22T12:00:00.000Z".to_string())));
        assert!(params.contains(&("limit", "5".to_string())));
    }

    #[test]
    fn test_samples_response_distinguishes_missing_from_empty() {
        let missing: SamplesResponse = serde_json::from_str(r#"{"samples": null}"#).unwrap();
        assert!(missing.samples.is_none());

        let empty: SamplesResponse = serde_json::from_str(r#"{"samples": []}"#).unwrap();
        assert_eq!(empty.samples, Some(Vec::new()));
    }

    #[test]
    fn test_open_lower_bound_omits_start() {
        let end = Utc.with_ymd_and_hms(2024, 1, 22, 12, 0, 0).unwrap();
        let window = TimeWindow::new(DateTime::<Utc>::MIN_UTC, end);
        let query = SampleQuery::uncapped(RecordTypeHandle::new("h"), Some(window));

        let params = query_params(&query);
        assert!(params.iter().all(|(name, _)| *name != "start"));
        assert!(params.contains(&("end", "2024-01-22T12:00:00.000Z".to_string())));
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let store = RemoteStore::new(RemoteStoreConfig::new("127.0.0.1", port, "t")).unwrap();
        assert!(!store.is_data_available().await);
    }

    #[tokio::test]
    async fn test_server_error_maps_to_server() {
        let (config, _) = serve(vec![route("/v1/samples", 500, "boom")]).await;
        let store = RemoteStore::new(config).unwrap();

        let query = SampleQuery::uncapped(RecordTypeHandle::new("remote:mindful"), None);
        match store.execute_query(query).await {
            Err(StoreError::Server { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("expected server error, got {other:?}"),
        }
        assert!(!store.is_data_available().await);
    }

    #[tokio::test]
    async fn test_null_samples_is_no_samples() {
        let (config, _) = serve(gateway(r#"{"samples": null}"#)).await;
        let store = RemoteStore::new(config).unwrap();

        let query = SampleQuery::uncapped(RecordTypeHandle::new("remote:mindful"), None);
        assert_eq!(store.execute_query(query).await, Ok(None));

        let outcome = Pipeline::new(Arc::new(store), None).run().await;
        assert_eq!(outcome.result, Err(MindfulError::NoSamples));
    }

    #[tokio::test]
    async fn test_full_run_against_gateway() {
        let (config, seen) = serve(gateway(
            r#"{"samples": [
                {"start": "2024-01-22T10:00:00Z", "end": "2024-01-22T10:10:30Z"},
                {"start": "2024-01-22T11:00:00Z", "end": "2024-01-22T11:05:00Z"}
            ]}"#,
        ))
        .await;
        let store = RemoteStore::new(config).unwrap();
        let client_id = store.client_id().to_string();

        let outcome = Pipeline::new(Arc::new(store), None).run().await;
        assert_eq!(outcome.result, Ok(15));
        assert_eq!(outcome.records_read, 2);

        let requests = seen.lock().unwrap().clone();
        assert_eq!(requests.len(), 4);
        assert!(requests[2].starts_with("POST /v1/authorizations"));
        for request in &requests {
            let request = request.to_ascii_lowercase();
            assert!(request.contains("authorization: bearer test-token"));
            assert!(request.contains(&format!("x-client-id: {}", client_id.to_ascii_lowercase())));
        }
    }

    #[tokio::test]
    async fn test_denied_authorization_skips_query() {
        let (config, seen) = serve(vec![
            route("/health", 200, r#"{"data_available": true}"#),
            route("/v1/record-types/", 200, r#"{"handle": "remote:mindful"}"#),
            route("/v1/authorizations", 200, r#"{"granted": false}"#),
        ])
        .await;
        let store = RemoteStore::new(config).unwrap();

        let outcome = Pipeline::new(Arc::new(store), None).run().await;
        assert_eq!(outcome.result, Err(MindfulError::NotAuthorized));
        assert!(seen
            .lock()
            .unwrap()
            .iter()
            .all(|r| !r.contains("/v1/samples")));
    }
}
