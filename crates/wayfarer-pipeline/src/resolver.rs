use tracing::{debug, error, warn};
use wayfarer_core::Coordinates;
use wayfarer_geo::Geocoder;

/// Turns a place name into coordinates using the provider's first match.
///
/// Provider failures and empty result sets both come back as `None`;
/// neither stops the run.
pub struct CoordinateResolver<G> {
    geocoder: G,
}

impl<G: Geocoder> CoordinateResolver<G> {
    pub fn new(geocoder: G) -> Self {
        Self { geocoder }
    }

    pub async fn resolve(&self, name: &str) -> Option<Coordinates> {
        match self.geocoder.geocode(name).await {
            Ok(matches) => {
                let Some(first) = matches.into_iter().next() else {
                    warn!(place = name, "no geocoding results");
                    return None;
                };
                debug!(
                    place = name,
                    lat = first.coordinates.latitude,
                    long = first.coordinates.longitude,
                    label = first.label.as_deref().unwrap_or(""),
                    "geocoded"
                );
                Some(first.coordinates)
            }
            Err(e) => {
                error!(place = name, error = %e, "geocoding request failed");
                None
            }
        }
    }
}
