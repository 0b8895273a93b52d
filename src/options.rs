//! Configuration bag for the routing API.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Settings for talking to the routing API.
///
/// This is an explicit value passed into every call of the core — there is no
/// ambient configuration. The owning layer (a settings UI, a config file)
/// creates it, edits it, and hands the core a fresh snapshot per run. The
/// core treats it as a validated-enough bag: unknown profile names and
/// arbitrary custom parameters pass through unchecked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiOptions {
    /// Base URL of the routing API, up to and including the trailing slash
    /// before the profile segment (e.g. "https://router.example.com/route/v1/")
    pub base_url: String,

    /// Access token, sent as the `access_token` query parameter
    pub access_token: String,

    /// Mapping from logical profile name to the API's profile identifier
    pub profiles: HashMap<String, String>,

    /// Geometry detail level of the overview (`overview` query parameter)
    pub overview: String,

    /// Whether to request turn-by-turn steps. The validator needs them:
    /// the route endpoint is read from the last step.
    pub steps: bool,

    /// Geometry encoding format (`geometries` query parameter)
    pub geometries: String,

    /// Start/end approach constraint, one value per waypoint separated by `;`
    pub approaches: String,

    /// Explicit ISO-8601 departure time. `None` means each request uses the
    /// current UTC time at call time.
    pub start_time: Option<String>,

    /// Extra query parameters appended verbatim. A `start_time` entry here is
    /// consumed by the start-time precedence rules instead of being appended.
    pub custom_params: BTreeMap<String, String>,
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            access_token: String::new(),
            profiles: default_profiles(),
            overview: "false".to_string(),
            steps: true,
            geometries: "polyline6".to_string(),
            approaches: "unrestricted;unrestricted".to_string(),
            start_time: None,
            custom_params: BTreeMap::new(),
        }
    }
}

impl ApiOptions {
    /// Resolve a logical profile name through the profile mapping.
    ///
    /// Names without a mapping pass through literally — the API decides
    /// whether it knows them.
    pub fn resolve_profile<'a>(&'a self, name: &'a str) -> &'a str {
        self.profiles.get(name).map(String::as_str).unwrap_or(name)
    }
}

fn default_profiles() -> HashMap<String, String> {
    ["van", "truck", "car", "bike", "foot"]
        .into_iter()
        .map(|profile| (profile.to_string(), profile.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ApiOptions::default();
        assert_eq!(options.overview, "false");
        assert!(options.steps);
        assert_eq!(options.geometries, "polyline6");
        assert_eq!(options.approaches, "unrestricted;unrestricted");
        assert_eq!(options.start_time, None);
        assert!(options.custom_params.is_empty());
        assert_eq!(options.profiles.len(), 5);
    }

    #[test]
    fn test_resolve_profile() {
        let mut options = ApiOptions::default();
        options
            .profiles
            .insert("truck".to_string(), "truck-v2".to_string());

        assert_eq!(options.resolve_profile("truck"), "truck-v2");
        assert_eq!(options.resolve_profile("car"), "car");
        // Unmapped names pass through literally
        assert_eq!(options.resolve_profile("hovercraft"), "hovercraft");
    }

    #[test]
    fn test_roundtrips_through_json() {
        let mut options = ApiOptions::default();
        options.base_url = "https://router.example.com/route/v1/".to_string();
        options
            .custom_params
            .insert("exclude".to_string(), "ferry".to_string());

        let json = serde_json::to_string(&options).unwrap();
        let parsed: ApiOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, options);
    }
}
