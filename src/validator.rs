//! Validation of a single route against the routing API.
//!
//! The validator drives one request through its lifecycle: local coordinate
//! check, HTTP call with retry/backoff for transient failures, endpoint
//! extraction, distance measurement. Every call produces exactly one
//! `RouteOutcome` — no error escapes this boundary, which keeps the batch
//! runner's aggregation total by construction.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::distance::haversine;
use crate::error::{Result, ValidatorError};
use crate::geometry::extract_last_coordinate;
use crate::http::HttpClient;
use crate::options::ApiOptions;
use crate::outcome::{OutcomeStatus, RouteOutcome};
use crate::request::{build_url, RouteRequest};
use crate::retry::RetrySettings;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Validates one route at a time.
///
/// Cheap to clone; the options bag is shared read-only across clones, which
/// is what lets the batch runner hand one validator to every worker task.
#[derive(Clone)]
pub struct RouteValidator<H: HttpClient> {
    http: H,
    options: Arc<ApiOptions>,
    profile: String,
    retry: RetrySettings,
    timeout: Duration,
}

impl<H: HttpClient> RouteValidator<H> {
    pub fn new(
        http: H,
        options: Arc<ApiOptions>,
        profile: impl Into<String>,
        retry: RetrySettings,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            options,
            profile: profile.into(),
            retry,
            timeout,
        }
    }

    /// Validate one route, producing its outcome record.
    ///
    /// Transient failures (transport errors, error status codes) are retried
    /// up to the configured budget with exponential backoff plus jitter. A
    /// response whose endpoint cannot be extracted is terminal — that is a
    /// property of the route, not a transient fault. Unexpected failures are
    /// terminal regardless of remaining budget.
    #[tracing::instrument(skip(self, request), fields(coordinates = %request.coordinate_path()))]
    pub async fn validate(&self, request: RouteRequest) -> RouteOutcome {
        if let Err(e) = request.check_coordinates() {
            warn!(error = %e, "Rejected before request");
            let message = match e {
                ValidatorError::InvalidCoordinates(message) => message,
                other => other.to_string(),
            };
            return RouteOutcome::failure(
                request,
                OutcomeStatus::InvalidCoordinates { message },
                0,
            );
        }

        // The URL is built once per route; retries reuse it, so a defaulted
        // start_time stays fixed across attempts for the same route.
        let url = build_url(&request, &self.options, &self.profile);
        let mut retry_count = 0u32;

        loop {
            match self.attempt(&url).await {
                Ok(Some((last_lon, last_lat))) => {
                    let distance = haversine(last_lon, last_lat, request.dest_lon, request.dest_lat);
                    debug!(
                        distance_m = distance,
                        retries = retry_count,
                        "Route endpoint measured"
                    );
                    return RouteOutcome::success(request, last_lon, last_lat, distance, retry_count);
                }
                Ok(None) => {
                    warn!(retries = retry_count, "Could not extract last coordinate");
                    return RouteOutcome::failure(request, OutcomeStatus::DecodeFailed, retry_count);
                }
                Err(e) if e.is_retryable() => {
                    if retry_count < self.retry.max_retries {
                        retry_count += 1;
                        let delay = self.retry.backoff(retry_count);
                        debug!(
                            error = %e,
                            retry = retry_count,
                            delay_ms = delay.as_millis() as u64,
                            "Transient failure, backing off"
                        );
                        tokio::time::sleep(delay).await;
                    } else {
                        warn!(error = %e, retries = retry_count, "Retry budget exhausted");
                        return RouteOutcome::failure(
                            request,
                            OutcomeStatus::TransportFailed {
                                message: e.to_string(),
                            },
                            retry_count,
                        );
                    }
                }
                Err(e) => {
                    warn!(error = %e, retries = retry_count, "Unexpected failure, not retrying");
                    return RouteOutcome::failure(
                        request,
                        OutcomeStatus::Unexpected {
                            message: e.to_string(),
                        },
                        retry_count,
                    );
                }
            }
        }
    }

    /// One request/decode attempt. `Ok(None)` means the response parsed but
    /// carried no extractable endpoint.
    async fn attempt(&self, url: &str) -> Result<Option<(f64, f64)>> {
        let response = self.http.get(url, self.timeout).await?;
        if response.status >= 400 {
            return Err(ValidatorError::Status(response.status));
        }

        let payload: Value = serde_json::from_str(&response.body)?;
        Ok(extract_last_coordinate(&payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpResponse, MockHttpClient};
    use serde_json::json;

    const BASE_URL: &str = "https://router.test/route/v1/";

    fn fast_retry() -> RetrySettings {
        RetrySettings {
            max_retries: 3,
            base_delay_secs: 0.001,
            jitter: 0.0,
        }
    }

    fn validator(mock: &MockHttpClient) -> RouteValidator<MockHttpClient> {
        let options = Arc::new(ApiOptions {
            base_url: BASE_URL.to_string(),
            ..ApiOptions::default()
        });
        RouteValidator::new(
            mock.clone(),
            options,
            "car",
            fast_retry(),
            Duration::from_secs(5),
        )
    }

    fn request() -> RouteRequest {
        RouteRequest::new(13.405, 52.52, 13.3777, 52.5163)
    }

    fn mock_key() -> String {
        format!("{}car/{}", BASE_URL, request().coordinate_path())
    }

    fn success_body() -> String {
        json!({
            "routes": [{
                "legs": [{
                    "steps": [{
                        "maneuver": { "location": [13.3777, 52.5163] }
                    }]
                }]
            }]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_invalid_coordinates_never_reach_network() {
        let mock = MockHttpClient::new();
        let validator = validator(&mock);

        let outcome = validator
            .validate(RouteRequest::new(13.405, f64::NAN, 13.3777, 52.5163))
            .await;

        assert_eq!(
            outcome.status.to_string(),
            "error: invalid coordinates - origin_lat is not finite (NaN)"
        );
        assert_eq!(outcome.retries, 0);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let mock = MockHttpClient::new();
        mock.add_response(
            &mock_key(),
            Ok(HttpResponse {
                status: 200,
                body: success_body(),
            }),
        );
        let validator = validator(&mock);

        let outcome = validator.validate(request()).await;
        assert!(outcome.status.is_success());
        assert_eq!(outcome.retries, 0);
        assert_eq!(outcome.last_route_lon, Some(13.3777));
        assert_eq!(outcome.last_route_lat, Some(52.5163));
        // Endpoint equals the requested destination
        assert!(outcome.distance_to_dest.unwrap() < 1e-6);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_retry_then_success() {
        let mock = MockHttpClient::new();
        for _ in 0..2 {
            mock.add_response(
                &mock_key(),
                Ok(HttpResponse {
                    status: 503,
                    body: String::new(),
                }),
            );
        }
        mock.add_response(
            &mock_key(),
            Ok(HttpResponse {
                status: 200,
                body: success_body(),
            }),
        );
        let validator = validator(&mock);

        let outcome = validator.validate(request()).await;
        assert!(outcome.status.is_success());
        assert_eq!(outcome.retries, 2);
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_retry_exhaustion() {
        let mock = MockHttpClient::new();
        for _ in 0..4 {
            mock.add_response(
                &mock_key(),
                Ok(HttpResponse {
                    status: 500,
                    body: String::new(),
                }),
            );
        }
        let validator = validator(&mock);

        let outcome = validator.validate(request()).await;
        assert_eq!(outcome.status.to_string(), "error: HTTP status 500");
        assert_eq!(outcome.retries, 3);
        // Initial attempt plus the full retry budget
        assert_eq!(mock.call_count(), 4);
        assert_eq!(outcome.distance_to_dest, None);
    }

    #[tokio::test]
    async fn test_decode_failure_is_not_retried() {
        let mock = MockHttpClient::new();
        mock.add_response(
            &mock_key(),
            Ok(HttpResponse {
                status: 200,
                body: json!({ "routes": [] }).to_string(),
            }),
        );
        let validator = validator(&mock);

        let outcome = validator.validate(request()).await;
        assert_eq!(
            outcome.status.to_string(),
            "error: could not extract last coordinate"
        );
        assert_eq!(outcome.retries, 0);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_json_is_unexpected() {
        let mock = MockHttpClient::new();
        mock.add_response(
            &mock_key(),
            Ok(HttpResponse {
                status: 200,
                body: "<html>not json</html>".to_string(),
            }),
        );
        let validator = validator(&mock);

        let outcome = validator.validate(request()).await;
        assert!(outcome.status.to_string().starts_with("error: unexpected - "));
        assert_eq!(outcome.retries, 0);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_error_is_not_retried() {
        let mock = MockHttpClient::new();
        mock.add_response(&mock_key(), Err(ValidatorError::Other(anyhow::anyhow!("boom"))));
        let validator = validator(&mock);

        let outcome = validator.validate(request()).await;
        assert_eq!(outcome.status.to_string(), "error: unexpected - boom");
        assert_eq!(outcome.retries, 0);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_decode_failure_after_retries_keeps_count() {
        let mock = MockHttpClient::new();
        mock.add_response(
            &mock_key(),
            Ok(HttpResponse {
                status: 502,
                body: String::new(),
            }),
        );
        mock.add_response(
            &mock_key(),
            Ok(HttpResponse {
                status: 200,
                body: json!({ "routes": [] }).to_string(),
            }),
        );
        let validator = validator(&mock);

        let outcome = validator.validate(request()).await;
        assert_eq!(
            outcome.status.to_string(),
            "error: could not extract last coordinate"
        );
        assert_eq!(outcome.retries, 1);
    }

    #[tokio::test]
    async fn test_passthrough_preserved_on_failure() {
        let mock = MockHttpClient::new();
        let validator = validator(&mock);

        let mut passthrough = serde_json::Map::new();
        passthrough.insert("store_number".to_string(), serde_json::Value::from("S-1"));
        let request = RouteRequest::new(1.0, f64::INFINITY, 3.0, 4.0).with_passthrough(passthrough);

        let outcome = validator.validate(request).await;
        assert_eq!(
            outcome.passthrough.get("store_number"),
            Some(&serde_json::Value::from("S-1"))
        );
    }
}
