//! Turns a [`LocationSpec`] into a [`ResolvedLocation`].

use std::sync::Arc;

use crate::client::RemoteClient;
use crate::error::ResolutionError;
use crate::types::{Candidate, LocationSpec, ResolvedLocation};

#[derive(Debug, Clone)]
pub struct LocationResolver {
    client: Arc<RemoteClient>,
    reverse_lookup: bool,
}

impl LocationResolver {
    pub fn new(client: Arc<RemoteClient>) -> Self {
        Self {
            client,
            reverse_lookup: false,
        }
    }

    /// Enable the best-effort reverse lookup for coordinate locations.
    pub fn with_reverse_lookup(mut self, enabled: bool) -> Self {
        self.reverse_lookup = enabled;
        self
    }

    /// Resolve a location. Makes no retries.
    ///
    /// Coordinates resolve without a geocoding call. Named places go through
    /// forward geocoding and [`pick_candidate`].
    pub async fn resolve(&self, spec: &LocationSpec) -> Result<ResolvedLocation, ResolutionError> {
        if !spec.is_usable() {
            return Err(ResolutionError::Unspecified);
        }

        match spec {
            LocationSpec::ByCoordinates(coords) => {
                let mut resolved = ResolvedLocation::from_coordinates(*coords);
                if self.reverse_lookup {
                    if let Some(name) = self.client.reverse_geocode(*coords).await {
                        resolved.display_place = name.place;
                        resolved.display_region = name.region;
                    }
                }
                tracing::debug!("Resolved coordinates to {}", resolved.display_name());
                Ok(resolved)
            }
            LocationSpec::ByName { place, region } => {
                let place = place.trim();
                let region = region.trim();
                let candidates = self
                    .client
                    .geocode_by_name(place, region)
                    .await
                    .map_err(ResolutionError::Transport)?;

                let chosen =
                    pick_candidate(&candidates, place).ok_or_else(|| ResolutionError::NotFound {
                        place: place.to_string(),
                        region: region.to_string(),
                    })?;

                let display_region = if chosen.country.is_empty() {
                    region.to_string()
                } else {
                    chosen.country.clone()
                };

                tracing::info!(
                    "Resolved '{}, {}' to {}, {} ({} candidates)",
                    place,
                    region,
                    chosen.latitude,
                    chosen.longitude,
                    candidates.len()
                );

                Ok(ResolvedLocation {
                    latitude: chosen.latitude,
                    longitude: chosen.longitude,
                    display_place: chosen.name.clone(),
                    display_region,
                })
            }
        }
    }
}

/// Prefer the candidate whose name equals `place` case-insensitively;
/// otherwise take the provider's top-ranked result.
pub fn pick_candidate<'a>(candidates: &'a [Candidate], place: &str) -> Option<&'a Candidate> {
    let wanted = place.trim().to_lowercase();
    candidates
        .iter()
        .find(|c| c.name.trim().to_lowercase() == wanted)
        .or_else(|| candidates.first())
}
