//! HTTP client abstraction for calling the routing API.
//!
//! This module defines the `HttpClient` trait to abstract HTTP request
//! execution, enabling testability with mock implementations.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Response from an HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as a string
    pub body: String,
}

/// Trait for executing HTTP GET requests against the routing API.
///
/// This abstraction allows for different implementations (production vs.
/// testing) and makes the validation logic testable without real HTTP calls.
/// Implementations return `Ok` for any response the server produced,
/// regardless of status code — the caller decides what a given status means.
#[async_trait]
pub trait HttpClient: Send + Sync + Clone {
    /// Execute a GET request with a per-request timeout.
    ///
    /// # Errors
    /// Returns an error if the request fails at the transport level
    /// (connection failure, timeout, invalid URL).
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse>;
}

// ============================================================================
// Production Implementation using reqwest
// ============================================================================

/// Production HTTP client using reqwest.
#[derive(Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a new reqwest-based HTTP client.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    #[tracing::instrument(skip(self, url))]
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse> {
        tracing::debug!(url = %url, timeout_ms = timeout.as_millis() as u64, "Executing HTTP request");

        let response = self.client.get(url).timeout(timeout).send().await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::debug!(status = status, response_len = body.len(), "HTTP request completed");

        Ok(HttpResponse { status, body })
    }
}

// ============================================================================
// Test/Mock Implementation
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// Mock HTTP client for testing.
///
/// Allows configuring predetermined responses without making actual HTTP
/// calls. Responses are keyed by the URL with its query string stripped
/// (queries carry call-time timestamps and are not stable across runs);
/// multiple responses for the same key are returned in FIFO order.
#[derive(Clone)]
pub struct MockHttpClient {
    responses: Arc<Mutex<HashMap<String, Vec<Result<HttpResponse>>>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

/// Record of a call made to the mock HTTP client.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub url: String,
    pub timeout: Duration,
}

fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a predetermined response for a query-less URL prefix.
    pub fn add_response(&self, key: &str, response: Result<HttpResponse>) {
        self.responses
            .lock()
            .entry(key.to_string())
            .or_default()
            .push(response);
    }

    /// Get all calls that have been made to this mock client.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Default for MockHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse> {
        self.calls.lock().push(MockCall {
            url: url.to_string(),
            timeout,
        });

        let key = strip_query(url).to_string();
        let mut responses = self.responses.lock();

        if let Some(queue) = responses.get_mut(&key) {
            if !queue.is_empty() {
                return queue.remove(0);
            }
        }

        Err(crate::error::ValidatorError::Other(anyhow::anyhow!(
            "no mock response configured for {}",
            key
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidatorError;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_mock_client_basic() {
        let mock = MockHttpClient::new();
        mock.add_response(
            "https://api.example.com/car/1,2;3,4",
            Ok(HttpResponse {
                status: 200,
                body: "success".to_string(),
            }),
        );

        let response = mock
            .get("https://api.example.com/car/1,2;3,4?steps=true", TIMEOUT)
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "success");

        let calls = mock.get_calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].url.ends_with("?steps=true"));
        assert_eq!(calls[0].timeout, TIMEOUT);
    }

    #[tokio::test]
    async fn test_mock_client_multiple_responses() {
        let mock = MockHttpClient::new();
        mock.add_response(
            "https://api.example.com/status",
            Ok(HttpResponse {
                status: 500,
                body: "first".to_string(),
            }),
        );
        mock.add_response(
            "https://api.example.com/status",
            Ok(HttpResponse {
                status: 200,
                body: "second".to_string(),
            }),
        );

        let first = mock.get("https://api.example.com/status", TIMEOUT).await.unwrap();
        assert_eq!(first.body, "first");
        assert_eq!(first.status, 500);

        let second = mock.get("https://api.example.com/status", TIMEOUT).await.unwrap();
        assert_eq!(second.body, "second");

        // Queue exhausted: further calls fail with the default error
        let third = mock.get("https://api.example.com/status", TIMEOUT).await;
        assert!(third.is_err());

        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_client_no_response() {
        let mock = MockHttpClient::new();
        let result = mock.get("https://api.example.com/unknown", TIMEOUT).await;
        assert!(matches!(result, Err(ValidatorError::Other(_))));
    }
}
