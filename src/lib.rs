//! Batch validation of routing-engine responses.
//!
//! Given a table of origin/destination coordinate pairs, this crate calls a
//! routing HTTP API per pair, extracts the actual endpoint of the returned
//! route geometry, and measures the great-circle distance between that
//! endpoint and the requested destination — a quality-control signal for a
//! fleet of routing profiles. It provides:
//!
//! - Per-route validation with retry logic and exponential backoff
//! - Batched processing under a bounded worker pool
//! - Total error handling: every route yields one outcome record
//! - Real-time progress updates over a broadcast stream
//!
//! # Example
//! ```ignore
//! use routecheck::{ApiOptions, BatchRunner, ReqwestHttpClient, RouteRequest, RunnerConfig};
//!
//! let options = Arc::new(ApiOptions {
//!     base_url: "https://router.example.com/route/v1/".to_string(),
//!     access_token: "token".to_string(),
//!     ..ApiOptions::default()
//! });
//! let runner = BatchRunner::new(
//!     ReqwestHttpClient::new(),
//!     options,
//!     "truck",
//!     RunnerConfig::default(),
//! );
//!
//! let requests = vec![RouteRequest::new(13.405, 52.52, 13.3777, 52.5163)];
//! let (outcomes, stats) = runner.run(requests).await;
//! ```

pub mod distance;
pub mod error;
pub mod geometry;
pub mod http;
pub mod options;
pub mod outcome;
pub mod request;
pub mod retry;
pub mod runner;
pub mod validator;

// Re-export commonly used types
pub use distance::haversine;
pub use error::{Result, ValidatorError};
pub use geometry::extract_last_coordinate;
pub use http::{HttpClient, HttpResponse, MockHttpClient, ReqwestHttpClient};
pub use options::ApiOptions;
pub use outcome::{BatchStats, OutcomeStatus, RouteOutcome};
pub use request::{build_url, RouteRequest};
pub use retry::RetrySettings;
pub use runner::{BatchRunner, ProgressUpdate, RunnerConfig};
pub use validator::RouteValidator;
