//! OpenStreetMap Nominatim search client.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use wayfarer_core::Coordinates;

use crate::{GeocodeError, GeocodeMatch, Geocoder};

pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Nominatim geocoder. The public instance requires an identifying
/// `User-Agent` and allows at most one request per second.
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
}

/// Nominatim returns coordinates as strings.
#[derive(Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

impl NominatimClient {
    pub fn new(base_url: &str, user_agent: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
        }
    }
}

fn parse_results(body: &str) -> Result<Vec<GeocodeMatch>, GeocodeError> {
    let results: Vec<NominatimResult> = serde_json::from_str(body)?;
    results
        .into_iter()
        .map(|r| {
            let lat: f64 = r
                .lat
                .parse()
                .map_err(|_| GeocodeError::BadCoordinate(format!("lat {:?}", r.lat)))?;
            let lon: f64 = r
                .lon
                .parse()
                .map_err(|_| GeocodeError::BadCoordinate(format!("lon {:?}", r.lon)))?;
            let coordinates =
                Coordinates::new(lat, lon).map_err(|e| GeocodeError::BadCoordinate(e.to_string()))?;
            Ok(GeocodeMatch {
                coordinates,
                label: r.display_name,
            })
        })
        .collect()
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn geocode(&self, query: &str) -> Result<Vec<GeocodeMatch>, GeocodeError> {
        let url = format!("{}/search", self.base_url);
        debug!(url = %url, query, "geocoding");

        let resp = self
            .client
            .get(&url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .header(reqwest::header::USER_AGENT, &self.user_agent)
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
