//! Per-route outcome records and run-wide statistics.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::request::RouteRequest;

/// Terminal status of one validated route.
///
/// Serialized (and displayed) as the flat status string of the outcome
/// table: `"success"` or an `"error: ..."` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// The route's endpoint was extracted and measured
    Success,

    /// A coordinate failed the local numeric check; the network was never contacted
    InvalidCoordinates { message: String },

    /// Transport-level failure that survived the whole retry budget
    TransportFailed { message: String },

    /// The response carried no extractable endpoint. A property of the
    /// route/profile combination, never retried.
    DecodeFailed,

    /// Any other failure; never retried
    Unexpected { message: String },
}

impl OutcomeStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, OutcomeStatus::Success)
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Success => write!(f, "success"),
            OutcomeStatus::InvalidCoordinates { message } => {
                write!(f, "error: invalid coordinates - {}", message)
            }
            OutcomeStatus::TransportFailed { message } => write!(f, "error: {}", message),
            OutcomeStatus::DecodeFailed => {
                write!(f, "error: could not extract last coordinate")
            }
            OutcomeStatus::Unexpected { message } => {
                write!(f, "error: unexpected - {}", message)
            }
        }
    }
}

impl Serialize for OutcomeStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One result record, created exactly once per request by the route
/// validator and immutable thereafter.
///
/// The endpoint coordinates and the distance are absent on any failure. The
/// retry count is carried on every terminal status — a route that succeeded
/// only after retries still reports success with `retries > 0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteOutcome {
    pub origin_lon: f64,
    pub origin_lat: f64,
    pub dest_lon: f64,
    pub dest_lat: f64,
    pub last_route_lon: Option<f64>,
    pub last_route_lat: Option<f64>,
    /// Great-circle distance from the route's endpoint to the requested
    /// destination, in meters
    pub distance_to_dest: Option<f64>,
    pub status: OutcomeStatus,
    /// Retry attempts consumed (0 when the first attempt decided the outcome)
    pub retries: u32,
    #[serde(flatten)]
    pub passthrough: Map<String, Value>,
}

impl RouteOutcome {
    /// Successful outcome: endpoint extracted, distance measured.
    pub fn success(
        request: RouteRequest,
        last_route_lon: f64,
        last_route_lat: f64,
        distance_to_dest: f64,
        retries: u32,
    ) -> Self {
        Self {
            origin_lon: request.origin_lon,
            origin_lat: request.origin_lat,
            dest_lon: request.dest_lon,
            dest_lat: request.dest_lat,
            last_route_lon: Some(last_route_lon),
            last_route_lat: Some(last_route_lat),
            distance_to_dest: Some(distance_to_dest),
            status: OutcomeStatus::Success,
            retries,
            passthrough: request.passthrough,
        }
    }

    /// Failed outcome of any kind; endpoint and distance stay absent.
    pub fn failure(request: RouteRequest, status: OutcomeStatus, retries: u32) -> Self {
        Self {
            origin_lon: request.origin_lon,
            origin_lat: request.origin_lat,
            dest_lon: request.dest_lon,
            dest_lat: request.dest_lat,
            last_route_lon: None,
            last_route_lat: None,
            distance_to_dest: None,
            status,
            retries,
            passthrough: request.passthrough,
        }
    }
}

/// Run-wide aggregate over an outcome table.
///
/// Purely derived — it can always be recomputed from the table, and is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_routes: usize,
    pub successful_routes: usize,
    pub failed_routes: usize,
    /// Percentage of successful routes, 0.0 for an empty table
    pub success_rate: f64,
    pub total_retries: u64,
    pub avg_retries: f64,
}

impl BatchStats {
    /// Recompute the aggregate from an outcome table.
    pub fn from_outcomes(outcomes: &[RouteOutcome]) -> Self {
        let total_routes = outcomes.len();
        let successful_routes = outcomes
            .iter()
            .filter(|outcome| outcome.status.is_success())
            .count();
        let failed_routes = total_routes - successful_routes;
        let total_retries: u64 = outcomes
            .iter()
            .map(|outcome| u64::from(outcome.retries))
            .sum();

        let (success_rate, avg_retries) = if total_routes == 0 {
            (0.0, 0.0)
        } else {
            (
                successful_routes as f64 / total_routes as f64 * 100.0,
                total_retries as f64 / total_routes as f64,
            )
        };

        Self {
            total_routes,
            successful_routes,
            failed_routes,
            success_rate,
            total_retries,
            avg_retries,
        }
    }
}
