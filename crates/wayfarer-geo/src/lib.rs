//! Geocoding layer: free-text place name → ranked coordinates.

mod nominatim;
mod opencage;

pub use nominatim::{DEFAULT_BASE_URL as NOMINATIM_BASE_URL, NominatimClient};
pub use opencage::{DEFAULT_BASE_URL as OPENCAGE_BASE_URL, OpenCageClient};

use async_trait::async_trait;
use thiserror::Error;
use wayfarer_core::Coordinates;

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("geocoder returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unusable coordinate in response: {0}")]
    BadCoordinate(String),
}

/// One ranked candidate for a query.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeMatch {
    pub coordinates: Coordinates,
    /// Provider's formatted name for the match, if any.
    pub label: Option<String>,
}

/// Free-text geocoding provider.
///
/// Returns candidates best first. An empty vector is a normal outcome for
/// unrecognisable or ambiguous names.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, query: &str) -> Result<Vec<GeocodeMatch>, GeocodeError>;
}

#[async_trait]
impl<T: Geocoder + ?Sized> Geocoder for Box<T> {
    async fn geocode(&self, query: &str) -> Result<Vec<GeocodeMatch>, GeocodeError> {
        (**self).geocode(query).await
    }
}
