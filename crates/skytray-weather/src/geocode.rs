//! Geocoding: place names to coordinates (Open-Meteo), and a best-effort
//! reverse lookup from coordinates to a place name (Nominatim).

use serde::Deserialize;

use crate::client::RemoteClient;
use crate::error::FetchError;
use crate::error_log::RequestSource;
use crate::types::{Candidate, Coordinates};

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    /// Omitted by the provider when nothing matched
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    latitude: f64,
    longitude: f64,
    name: String,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

/// Display name produced by a reverse lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceName {
    pub place: String,
    pub region: String,
}

impl RemoteClient {
    /// Forward-geocode `place` within `region`, returning candidates in the
    /// provider's ranking order (possibly none).
    pub async fn geocode_by_name(
        &self,
        place: &str,
        region: &str,
    ) -> Result<Vec<Candidate>, FetchError> {
        let mut url = self.geocode_url.clone();
        url.query_pairs_mut()
            .append_pair("name", place)
            .append_pair("country", region)
            .append_pair("count", &self.config.geocode_count.to_string())
            .append_pair("language", &self.config.language);

        self.get_json(RequestSource::Geocode, url, |body: GeocodeResponse| {
            Ok(body
                .results
                .into_iter()
                .map(|r| Candidate {
                    latitude: r.latitude,
                    longitude: r.longitude,
                    name: r.name,
                    country: r.country.unwrap_or_default(),
                })
                .collect())
        })
        .await
    }

    /// Reverse geocode coordinates to a human-readable place name.
    /// Returns `None` on failure or timeout; the caller can fall back to coordinates.
    pub async fn reverse_geocode(&self, coords: Coordinates) -> Option<PlaceName> {
        let mut url = self.reverse_geocode_url.clone();
        url.query_pairs_mut()
            .append_pair("lat", &coords.latitude.to_string())
            .append_pair("lon", &coords.longitude.to_string())
            .append_pair("format", "json")
            .append_pair("addressdetails", "1")
            .append_pair("zoom", "10")
            .append_pair("accept-language", &self.config.language);

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Reverse geocode request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Reverse geocode returned status {}", response.status());
            return None;
        }

        let body: NominatimResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!("Reverse geocode parse error: {}", e);
                return None;
            }
        };

        let name = place_from_address(body.address?)?;
        tracing::info!("Reverse geocoded to: {}, {}", name.place, name.region);
        Some(name)
    }
}

fn place_from_address(addr: NominatimAddress) -> Option<PlaceName> {
    let region = addr
        .country
        .clone()
        .or_else(|| addr.state.clone())
        .unwrap_or_default();

    // Prefer city > town > village > municipality for the primary place name
    let place = addr
        .city
        .or(addr.town)
        .or(addr.village)
        .or(addr.municipality)
        .or(addr.county)
        .or(addr.state)
        .or(addr.country)?;

    let region = if region == place { String::new() } else { region };
    Some(PlaceName { place, region })
}
