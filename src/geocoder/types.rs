//! Core types for the geocoding subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The resolver's own accuracy tier for a returned point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationType {
    Rooftop,
    RangeInterpolated,
    GeometricCenter,
    Approximate,
    #[serde(other)]
    Unknown,
}

impl LocationType {
    /// Map the provider's tag; anything unrecognized becomes `Unknown`.
    pub fn from_api(tag: &str) -> Self {
        match tag.trim().to_uppercase().as_str() {
            "ROOFTOP" => Self::Rooftop,
            "RANGE_INTERPOLATED" => Self::RangeInterpolated,
            "GEOMETRIC_CENTER" => Self::GeometricCenter,
            "APPROXIMATE" => Self::Approximate,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rooftop => "ROOFTOP",
            Self::RangeInterpolated => "RANGE_INTERPOLATED",
            Self::GeometricCenter => "GEOMETRIC_CENTER",
            Self::Approximate => "APPROXIMATE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved point with the provider's address and accuracy tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub formatted_address: String,
    pub location_type: LocationType,
}

/// Why a single geocode lookup failed. None of these abort a batch.
#[derive(Debug, Clone, Error)]
pub enum GeocodeError {
    /// Transport failure: DNS, TLS, timeout, connection reset.
    #[error("network error: {0}")]
    Network(String),

    #[error("no results for '{0}'")]
    NoMatch(String),

    #[error("query limit exceeded")]
    QuotaExceeded,

    /// Usually a bad API key or disabled billing.
    #[error("request denied: {0}")]
    Denied(String),

    #[error("geocoder returned status {0}")]
    Api(String),

    #[error("malformed geocoder response: {0}")]
    MalformedResponse(String),

    #[error("offline mode and '{0}' is not cached")]
    Offline(String),
}

impl GeocodeError {
    /// Short category label used in logs and the run summary.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::NoMatch(_) => "no-match",
            Self::QuotaExceeded => "quota-exceeded",
            Self::Denied(_) => "denied",
            Self::Api(_) => "api",
            Self::MalformedResponse(_) => "malformed-response",
            Self::Offline(_) => "offline",
        }
    }
}

/// Anything that turns a query string into a coordinate.
pub trait Geocoder {
    fn geocode(&mut self, query: &str) -> Result<GeocodeResult, GeocodeError>;
}

impl<G: Geocoder + ?Sized> Geocoder for Box<G> {
    fn geocode(&mut self, query: &str) -> Result<GeocodeResult, GeocodeError> {
        (**self).geocode(query)
    }
}

/// Never touches the network; every lookup fails with `GeocodeError::Offline`.
/// Paired with a cache, this gives a cache-only run.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineGeocoder;

impl Geocoder for OfflineGeocoder {
    fn geocode(&mut self, query: &str) -> Result<GeocodeResult, GeocodeError> {
        Err(GeocodeError::Offline(query.to_string()))
    }
}
