//! Geocoding providers: Mapbox, Photon and Nominatim.
//!
//! Each provider maps an address to a request and its response body to at
//! most one coordinate. Network access goes through [`HttpClient`].

use super::http::{HttpClient, ProviderRequest};
use super::types::{Coordinate, GeocodeError, ProviderKind};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use serde_with::{serde_as, DisplayFromStr, PickFirst};

pub const MAPBOX_ENDPOINT: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";
pub const PHOTON_ENDPOINT: &str = "https://photon.komoot.io/api/";
pub const NOMINATIM_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";

// Unreserved characters stay literal in the Mapbox path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A configured provider, ready to be queried.
#[derive(Debug, Clone, PartialEq)]
pub enum Provider {
    Mapbox { token: String },
    Photon,
    Nominatim,
}

/// Result of asking one provider about one address.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Found(Coordinate),
    NoMatch,
    Failed(GeocodeError),
}

impl Provider {
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::Mapbox { .. } => ProviderKind::Mapbox,
            Self::Photon => ProviderKind::Photon,
            Self::Nominatim => ProviderKind::Nominatim,
        }
    }

    /// Build the request for `address`, tagged with `user_agent`.
    pub fn request(&self, address: &str, user_agent: &str) -> ProviderRequest {
        match self {
            Self::Mapbox { token } => {
                let url = format!(
                    "{}/{}.json",
                    MAPBOX_ENDPOINT,
                    utf8_percent_encode(address, PATH_SEGMENT)
                );
                ProviderRequest::get(url)
                    .param("access_token", token.as_str())
                    .param("limit", "1")
                    .param("language", "en")
                    .header("User-Agent", user_agent)
            }
            Self::Photon => ProviderRequest::get(PHOTON_ENDPOINT)
                .param("q", address)
                .param("limit", "1")
                .param("lang", "en")
                .header("User-Agent", user_agent),
            Self::Nominatim => ProviderRequest::get(NOMINATIM_ENDPOINT)
                .param("format", "json")
                .param("q", address)
                .param("limit", "1")
                .param("addressdetails", "0")
                .header("User-Agent", user_agent)
                .header("Accept-Language", "en"),
        }
    }

    /// Normalize a decoded response body.
    ///
    /// `Ok(None)` means the provider answered but had no match.
    pub fn extract(&self, body: Value) -> Result<Option<Coordinate>, GeocodeError> {
        match self {
            Self::Mapbox { .. } => {
                let collection: FeatureCollection<MapboxFeature> = decode(body)?;
                match collection.features.first() {
                    Some(feature) => lon_lat(&feature.center).map(Some),
                    None => Ok(None),
                }
            }
            Self::Photon => {
                let collection: FeatureCollection<PhotonFeature> = decode(body)?;
                match collection.features.first() {
                    Some(feature) => lon_lat(&feature.geometry.coordinates).map(Some),
                    None => Ok(None),
                }
            }
            Self::Nominatim => {
                let hits: Vec<NominatimHit> = decode(body)?;
                match hits.first() {
                    Some(hit) => Coordinate::new(hit.lat, hit.lon).map(Some),
                    None => Ok(None),
                }
            }
        }
    }

    /// Query this provider for `address`. Never panics or propagates.
    pub fn attempt<C: HttpClient>(
        &self,
        client: &C,
        address: &str,
        user_agent: &str,
    ) -> AttemptOutcome {
        let request = self.request(address, user_agent);
        let body = match client.get_json(&request) {
            Ok(body) => body,
            Err(e) => return AttemptOutcome::Failed(e),
        };
        match self.extract(body) {
            Ok(Some(coordinate)) => AttemptOutcome::Found(coordinate),
            Ok(None) => AttemptOutcome::NoMatch,
            Err(e) => AttemptOutcome::Failed(e),
        }
    }
}

// ─── Response shapes ────────────────────────────────────────────

#[derive(Deserialize)]
struct FeatureCollection<F> {
    #[serde(default = "Vec::new")]
    features: Vec<F>,
}

#[derive(Deserialize)]
struct MapboxFeature {
    /// `[lon, lat]`
    center: Vec<f64>,
}

#[derive(Deserialize)]
struct PhotonFeature {
    geometry: PointGeometry,
}

#[derive(Deserialize)]
struct PointGeometry {
    /// `[lon, lat]`, possibly followed by altitude.
    coordinates: Vec<f64>,
}

// Nominatim encodes lat/lon as strings.
#[serde_as]
#[derive(Deserialize)]
struct NominatimHit {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    lat: f64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    lon: f64,
}

fn decode<T: DeserializeOwned>(body: Value) -> Result<T, GeocodeError> {
    serde_json::from_value(body).map_err(|e| GeocodeError::InvalidResponse(e.to_string()))
}

fn lon_lat(position: &[f64]) -> Result<Coordinate, GeocodeError> {
    match position {
        [lon, lat, ..] => Coordinate::from_lon_lat([*lon, *lat]),
        _ => Err(GeocodeError::InvalidResponse(format!(
            "expected [lon, lat], got {} values",
            position.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::http::fake::FakeClient;
    use approx::assert_relative_eq;
    use serde_json::json;

    const UA: &str = "test-agent/1.0";

    fn mapbox() -> Provider {
        Provider::Mapbox {
            token: "pk.test".into(),
        }
    }

    #[test]
    fn test_mapbox_request_shape() {
        let req = mapbox().request("1 Market St, San Francisco", UA);
        assert_eq!(
            req.url,
            format!("{}/1%20Market%20St%2C%20San%20Francisco.json", MAPBOX_ENDPOINT)
        );
        assert_eq!(req.query_value("access_token"), Some("pk.test"));
        assert_eq!(req.query_value("limit"), Some("1"));
        assert_eq!(req.query_value("language"), Some("en"));
        assert_eq!(req.header_value("User-Agent"), Some(UA));
    }

    #[test]
    fn test_photon_request_shape() {
        let req = Provider::Photon.request("Pier 39", UA);
        assert_eq!(req.url, PHOTON_ENDPOINT);
        assert_eq!(req.query_value("q"), Some("Pier 39"));
        assert_eq!(req.query_value("limit"), Some("1"));
        assert_eq!(req.query_value("lang"), Some("en"));
    }

    #[test]
    fn test_nominatim_request_shape() {
        let req = Provider::Nominatim.request("Pier 39", UA);
        assert_eq!(req.url, NOMINATIM_ENDPOINT);
        assert_eq!(req.query_value("format"), Some("json"));
        assert_eq!(req.query_value("q"), Some("Pier 39"));
        assert_eq!(req.query_value("limit"), Some("1"));
        assert_eq!(req.header_value("Accept-Language"), Some("en"));
        assert_eq!(req.header_value("User-Agent"), Some(UA));
    }

    #[test]
    fn test_mapbox_center_is_swapped() {
        let body = json!({
            "features": [{ "center": [-122.4, 37.8], "place_name": "x" }]
        });
        let c = mapbox().extract(body).unwrap().unwrap();
        assert_relative_eq!(c.lat, 37.8);
        assert_relative_eq!(c.lng, -122.4);
    }

    #[test]
    fn test_photon_geometry_is_swapped() {
        let body = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [-122.4, 37.8] },
                "properties": { "name": "Somewhere" }
            }]
        });
        let c = Provider::Photon.extract(body).unwrap().unwrap();
        assert_relative_eq!(c.lat, 37.8);
        assert_relative_eq!(c.lng, -122.4);
    }

    #[test]
    fn test_nominatim_string_fields() {
        let body = json!([{ "lat": "37.8", "lon": "-122.4", "display_name": "x" }]);
        let c = Provider::Nominatim.extract(body).unwrap().unwrap();
        assert_relative_eq!(c.lat, 37.8);
        assert_relative_eq!(c.lng, -122.4);
    }

    #[test]
    fn test_nominatim_numeric_fields() {
        let body = json!([{ "lat": 37.8, "lon": -122.4 }]);
        let c = Provider::Nominatim.extract(body).unwrap().unwrap();
        assert_relative_eq!(c.lat, 37.8);
    }

    #[test]
    fn test_empty_results_are_no_match() {
        assert_eq!(mapbox().extract(json!({ "features": [] })).unwrap(), None);
        assert_eq!(Provider::Photon.extract(json!({})).unwrap(), None);
        assert_eq!(Provider::Nominatim.extract(json!([])).unwrap(), None);
    }

    #[test]
    fn test_malformed_body_is_invalid_response() {
        let err = Provider::Nominatim
            .extract(json!({ "error": "x" }))
            .unwrap_err();
        assert!(matches!(err, GeocodeError::InvalidResponse(_)));

        let err = Provider::Photon
            .extract(json!({ "features": [{ "geometry": { "coordinates": [1.0] } }] }))
            .unwrap_err();
        assert!(matches!(err, GeocodeError::InvalidResponse(_)));
    }

    #[test]
    fn test_out_of_range_is_invalid_response() {
        let err = Provider::Nominatim
            .extract(json!([{ "lat": "137.8", "lon": "0" }]))
            .unwrap_err();
        assert!(matches!(err, GeocodeError::InvalidResponse(_)));
    }

    #[test]
    fn test_attempt_outcomes() {
        let client = FakeClient::new(|req| {
            if req.url.contains("photon") {
                Ok(json!({ "features": [] }))
            } else {
                Err(GeocodeError::Status(429))
            }
        });

        assert_eq!(Provider::Photon.attempt(&client, "x", UA), AttemptOutcome::NoMatch);
        assert_eq!(
            Provider::Nominatim.attempt(&client, "x", UA),
            AttemptOutcome::Failed(GeocodeError::Status(429))
        );
        assert_eq!(client.requests().len(), 2);
    }
}
