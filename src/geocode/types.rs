//! Core types for the geocoding subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which geocoding service produced (or failed to produce) a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Mapbox places search. Requires an access token.
    Mapbox,
    /// Komoot Photon.
    Photon,
    /// OpenStreetMap Nominatim.
    Nominatim,
}

impl ProviderKind {
    /// Parse a preference setting (e.g. `GEOCODER_PROVIDER`). Case-insensitive.
    pub fn from_setting(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "mapbox" => Some(Self::Mapbox),
            "photon" => Some(Self::Photon),
            "nominatim" => Some(Self::Nominatim),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mapbox => "mapbox",
            Self::Photon => "photon",
            Self::Nominatim => "nominatim",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting non-finite or out-of-range values.
    pub fn new(lat: f64, lng: f64) -> Result<Self, GeocodeError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(GeocodeError::InvalidResponse(format!(
                "latitude {} out of range",
                lat
            )));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(GeocodeError::InvalidResponse(format!(
                "longitude {} out of range",
                lng
            )));
        }
        Ok(Self { lat, lng })
    }

    /// Build from a GeoJSON-style `[lon, lat]` pair.
    pub fn from_lon_lat(pair: [f64; 2]) -> Result<Self, GeocodeError> {
        let [lon, lat] = pair;
        Self::new(lat, lon)
    }
}

/// One row of the persisted output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRecord {
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

impl ResolvedRecord {
    pub fn new(address: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            address: address.into(),
            lat: coordinate.lat,
            lng: coordinate.lng,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// Why a single provider did not yield a coordinate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeocodeError {
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("no match")]
    NoMatch,
}

/// A provider that was tried for an address and did not produce a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderAttempt {
    pub provider: ProviderKind,
    #[serde(serialize_with = "serialize_display")]
    pub error: GeocodeError,
}

impl fmt::Display for ProviderAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.error)
    }
}

fn serialize_display<S: serde::Serializer>(
    value: &GeocodeError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}
