//! Route requests and the URL builder for the routing API.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::error::{Result, ValidatorError};
use crate::options::ApiOptions;

/// One unit of validation work: route from origin to destination.
///
/// Passthrough holds whatever extra columns the source table carried (store
/// identifiers, DC codes, ...). The core never looks at it; it is preserved
/// unchanged into the outcome record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub origin_lon: f64,
    pub origin_lat: f64,
    pub dest_lon: f64,
    pub dest_lat: f64,

    #[serde(flatten)]
    pub passthrough: Map<String, Value>,
}

impl RouteRequest {
    /// Create a request with an empty passthrough payload.
    pub fn new(origin_lon: f64, origin_lat: f64, dest_lon: f64, dest_lat: f64) -> Self {
        Self {
            origin_lon,
            origin_lat,
            dest_lon,
            dest_lat,
            passthrough: Map::new(),
        }
    }

    /// Attach a passthrough payload.
    pub fn with_passthrough(mut self, passthrough: Map<String, Value>) -> Self {
        self.passthrough = passthrough;
        self
    }

    /// The coordinate pair as the API's path segment: `"olon,olat;dlon,dlat"`.
    pub fn coordinate_path(&self) -> String {
        format!(
            "{},{};{},{}",
            self.origin_lon, self.origin_lat, self.dest_lon, self.dest_lat
        )
    }

    /// Check that all four coordinates are finite numbers.
    ///
    /// A request failing this check must never reach the network layer; the
    /// validator records it as a local validation error with zero retries.
    pub fn check_coordinates(&self) -> Result<()> {
        let coordinates = [
            ("origin_lon", self.origin_lon),
            ("origin_lat", self.origin_lat),
            ("dest_lon", self.dest_lon),
            ("dest_lat", self.dest_lat),
        ];
        for (name, value) in coordinates {
            if !value.is_finite() {
                return Err(ValidatorError::InvalidCoordinates(format!(
                    "{} is not finite ({})",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Build the request URL for one coordinate pair.
///
/// Shape: `{base_url}{profile}/{olon,olat;dlon,dlat}?{query}`. The profile
/// name resolves through `options.profiles` with literal fallback. The query
/// carries the recognized options plus every custom parameter, form-encoded.
///
/// `start_time` precedence: an explicit `options.start_time` wins, then a
/// `custom_params["start_time"]` entry, then the current UTC time. The
/// default is taken per request at build time, so every route of a run gets
/// its own timestamp; retries of one route reuse the URL built for it.
pub fn build_url(request: &RouteRequest, options: &ApiOptions, profile_name: &str) -> String {
    let profile = options.resolve_profile(profile_name);

    let start_time = options
        .start_time
        .clone()
        .or_else(|| options.custom_params.get("start_time").cloned())
        .unwrap_or_else(|| Utc::now().format("%Y-%m-%dT%H:%M:%S+00:00").to_string());

    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("overview", &options.overview);
    query.append_pair("steps", if options.steps { "true" } else { "false" });
    query.append_pair("access_token", &options.access_token);
    query.append_pair("approaches", &options.approaches);
    query.append_pair("geometries", &options.geometries);
    query.append_pair("start_time", &start_time);
    for (key, value) in &options.custom_params {
        if key != "start_time" {
            query.append_pair(key, value);
        }
    }

    format!(
        "{}{}/{}?{}",
        options.base_url,
        profile,
        request.coordinate_path(),
        query.finish()
    )
}
