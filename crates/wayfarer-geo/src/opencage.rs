//! OpenCage forward geocoding client.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use wayfarer_core::Coordinates;

use crate::{GeocodeError, GeocodeMatch, Geocoder};

pub const DEFAULT_BASE_URL: &str = "https://api.opencagedata.com";

/// OpenCage geocoder. Requests only the best match (`limit=1`).
pub struct OpenCageClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct OpenCageResponse {
    #[serde(default)]
    results: Vec<OpenCageResult>,
}

#[derive(Deserialize)]
struct OpenCageResult {
    geometry: Geometry,
    #[serde(default)]
    formatted: Option<String>,
}

#[derive(Deserialize)]
struct Geometry {
    lat: f64,
    lng: f64,
}

impl OpenCageClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    /// Point at a different deployment (proxy, mock server).
    pub fn with_base_url(base_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/geocode/v1/json", self.base_url)
    }
}

fn parse_results(body: &str) -> Result<Vec<GeocodeMatch>, GeocodeError> {
    let resp: OpenCageResponse = serde_json::from_str(body)?;
    resp.results
        .into_iter()
        .map(|r| {
            let coordinates = Coordinates::new(r.geometry.lat, r.geometry.lng)
                .map_err(|e| GeocodeError::BadCoordinate(e.to_string()))?;
            Ok(GeocodeMatch {
                coordinates,
                label: r.formatted,
            })
        })
        .collect()
}

#[async_trait]
impl Geocoder for OpenCageClient {
    async fn geocode(&self, query: &str) -> Result<Vec<GeocodeMatch>, GeocodeError> {
        let url = self.endpoint();
        debug!(url = %url, query, "geocoding");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("key", self.api_key.as_str()),
                ("limit", "1"),
                ("no_annotations", "1"),
            ])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeocodeError::Server {
                status: status.as_u16(),
                body,
            });
        }

        parse_results(&resp.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_result() {
        let body = r#"{
            "documentation": "https://opencagedata.com/api",
            "results": [
                {
                    "components": {"city": "Paris", "country": "France"},
                    "confidence": 6,
                    "formatted": "Paris, France",
                    "geometry": {"lat": 48.8588897, "lng": 2.3200410}
                }
            ],
            "status": {"code": 200, "message": "OK"},
            "total_results": 1
        }"#;
        let matches = parse_results(body).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].coordinates.latitude, 48.8588897);
        assert_eq!(matches[0].coordinates.longitude, 2.3200410);
        assert_eq!(matches[0].label.as_deref(), Some("Paris, France"));
    }

    #[test]
    fn no_results_is_empty() {
        let body =
            r#"{"results": [], "status": {"code": 200, "message": "OK"}, "total_results": 0}"#;
        assert!(parse_results(body).unwrap().is_empty());
    }

    #[test]
    fn null_island_is_a_real_result() {
        let body = r#"{"results": [{"geometry": {"lat": 0.0, "lng": 0.0}}]}"#;
        let matches = parse_results(body).unwrap();
        assert_eq!(matches[0].coordinates, Coordinates::new(0.0, 0.0).unwrap());
        assert!(matches[0].label.is_none());
    }

    #[test]
    fn out_of_range_is_bad_coordinate() {
        let body = r#"{"results": [{"geometry": {"lat": 123.0, "lng": 0.0}}]}"#;
        assert!(matches!(
            parse_results(body),
            Err(GeocodeError::BadCoordinate(_))
        ));
    }

    #[test]
    fn garbage_is_json_error() {
        assert!(matches!(
            parse_results("<html>rate limited</html>"),
            Err(GeocodeError::Json(_))
        ));
    }

    #[test]
    fn endpoint_from_base() {
        let c = OpenCageClient::with_base_url("http://localhost:8080/", "k");
        assert_eq!(c.endpoint(), "http://localhost:8080/geocode/v1/json");
        assert_eq!(
            OpenCageClient::new("k").endpoint(),
            format!("{DEFAULT_BASE_URL}/geocode/v1/json")
        );
    }
}
