//! Geocoding collaborators for the batch pipeline.
//!
//! Provides the `Geocoder` seam, the Google Geocoding API client, an
//! offline stand-in, and a local result cache.

pub mod cache;
pub mod google;
pub mod types;

pub use cache::GeocodeCache;
pub use google::GoogleGeocoder;
pub use types::{GeocodeError, GeocodeResult, Geocoder, LocationType, OfflineGeocoder};
