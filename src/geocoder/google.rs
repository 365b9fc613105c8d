//! Google Geocoding API provider.

use super::types::{GeocodeError, GeocodeResult, Geocoder, LocationType};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const GOOGLE_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("label_geocoder/", env!("CARGO_PKG_VERSION"));

// ─── Wire format ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    status: String,
    #[serde(default)]
    results: Vec<GoogleResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleResult {
    #[serde(default)]
    formatted_address: String,
    geometry: GoogleGeometry,
}

#[derive(Debug, Deserialize)]
struct GoogleGeometry {
    location: GoogleLatLng,
    #[serde(default)]
    location_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleLatLng {
    lat: f64,
    lng: f64,
}

// ─── Client ─────────────────────────────────────────────────────

/// Blocking client for the Google Geocoding API.
pub struct GoogleGeocoder {
    agent: ureq::Agent,
    api_key: String,
}

impl GoogleGeocoder {
    pub fn new(api_key: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            api_key: api_key.into(),
        }
    }
}

impl Geocoder for GoogleGeocoder {
    fn geocode(&mut self, query: &str) -> Result<GeocodeResult, GeocodeError> {
        debug!(query, "requesting Google geocode");

        let response = self
            .agent
            .get(GOOGLE_GEOCODE_URL)
            .query("address", query)
            .query("key", &self.api_key)
            .call()
            .map_err(map_transport_error)?;

        let body: GoogleResponse = response
            .into_json()
            .map_err(|e| GeocodeError::MalformedResponse(e.to_string()))?;

        interpret_response(query, body)
    }
}

fn map_transport_error(err: ureq::Error) -> GeocodeError {
    match err {
        ureq::Error::Status(429, _) => GeocodeError::QuotaExceeded,
        ureq::Error::Status(code, _) => GeocodeError::Api(format!("HTTP {}", code)),
        ureq::Error::Transport(t) => GeocodeError::Network(t.to_string()),
    }
}

/// Turn a decoded API body into a result or a categorized failure.
fn interpret_response(query: &str, body: GoogleResponse) -> Result<GeocodeResult, GeocodeError> {
    match body.status.as_str() {
        "OK" => {
            let best = body
                .results
                .into_iter()
                .next()
                .ok_or_else(|| GeocodeError::NoMatch(query.to_string()))?;

            let location_type = best
                .geometry
                .location_type
                .as_deref()
                .map(LocationType::from_api)
                .unwrap_or(LocationType::Unknown);

            Ok(GeocodeResult {
                latitude: best.geometry.location.lat,
                longitude: best.geometry.location.lng,
                formatted_address: best.formatted_address,
                location_type,
            })
        }
        "ZERO_RESULTS" => Err(GeocodeError::NoMatch(query.to_string())),
        "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => Err(GeocodeError::QuotaExceeded),
        "REQUEST_DENIED" => Err(GeocodeError::Denied(
            body.error_message.unwrap_or_else(|| "no error message".into()),
        )),
        other => Err(GeocodeError::Api(other.to_string())),
    }
}
