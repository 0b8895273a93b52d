//! Extraction of the final coordinate from a routing API response.
//!
//! The routing API returns `routes[].legs[].steps[]`, where each step may
//! carry an encoded polyline geometry and/or a maneuver location. The route's
//! actual endpoint is the last coordinate of the last step of the first leg.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct RouteResponse {
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    #[serde(default)]
    legs: Vec<Leg>,
}

#[derive(Debug, Deserialize)]
struct Leg {
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct Step {
    geometry: Option<String>,
    maneuver: Option<Maneuver>,
}

#[derive(Debug, Deserialize)]
struct Maneuver {
    location: Option<[f64; 2]>,
}

/// Extract the last coordinate of the routed path from a response payload.
///
/// Returns `(lon, lat)` of the route's actual endpoint, or `None` when the
/// payload has no usable geometry. Resolution order for the last step of the
/// first leg:
///
/// 1. the step's `geometry` field, decoded as a precision-6 polyline —
///    the last decoded coordinate wins;
/// 2. the step's `maneuver.location`, which is already `[lon, lat]`.
///
/// Absence is a normal outcome here, not an error: an empty `routes` list,
/// a route without legs, a leg without steps, an undecodable geometry, or a
/// payload of the wrong shape all yield `None` and never panic. The caller
/// turns `None` into a decode-error outcome.
pub fn extract_last_coordinate(payload: &Value) -> Option<(f64, f64)> {
    let response: RouteResponse = serde_json::from_value(payload.clone()).ok()?;
    let step = response.routes.first()?.legs.first()?.steps.last()?;

    if let Some(geometry) = &step.geometry {
        let line = polyline::decode_polyline(geometry, 6).ok()?;
        // decode_polyline yields x = lon, y = lat
        if let Some(coordinate) = line.0.last() {
            return Some((coordinate.x, coordinate.y));
        }
        // An empty geometry falls through to the maneuver location.
    }

    step.maneuver
        .as_ref()?
        .location
        .map(|location| (location[0], location[1]))
}
