//! Forward geocoding: turn a free-text place name into coordinates.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use crate::provider::build_http_client;
use crate::types::{GeoError, Place};
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;
use wdash_core::{NetworkError, ReqwestErrorExt, WeatherConfig};

/// Number of candidates requested per lookup
const CANDIDATE_LIMIT: &str = "6";

#[derive(Debug, Deserialize)]
struct NominatimCandidate {
    display_name: Option<String>,
    lat: String,
    lon: String,
}

/// Client for the place-search endpoint.
#[derive(Debug, Clone)]
pub struct GeocodingClient {
    client: Client,
    search_url: String,
    language: String,
}

impl GeocodingClient {
    pub fn new(config: &WeatherConfig) -> Result<Self, GeoError> {
        let client = build_http_client(config.request_timeout_secs)?;
        Ok(Self {
            client,
            search_url: config.geocoding_url.clone(),
            language: config.language.clone(),
        })
    }

    /// Resolve `query` to the first matching place.
    ///
    /// `query` must already be trimmed and non-empty.
    #[instrument(skip(self), level = "info")]
    pub async fn resolve(&self, query: &str) -> Result<Place, GeoError> {
        let response = self
            .client
            .get(&self.search_url)
            .query(&[("q", query), ("format", "json"), ("limit", CANDIDATE_LIMIT)])
            .header(reqwest::header::ACCEPT_LANGUAGE, self.language.as_str())
            .send()
            .await
            .map_err(ReqwestErrorExt::into_network_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::debug!("Geocoding returned status {}: {}", status, text);
            return Err(NetworkError::from_status(status, text).into());
        }

        let body = response
            .bytes()
            .await
            .map_err(ReqwestErrorExt::into_network_error)?;
        let candidates: Vec<NominatimCandidate> = serde_json::from_slice(&body)
            .map_err(|e| GeoError::MalformedResponse(e.to_string()))?;

        tracing::debug!("Geocoding returned {} candidates", candidates.len());

        let first = candidates
            .into_iter()
            .next()
            .ok_or_else(|| GeoError::NotFound(query.to_string()))?;

        let place = candidate_to_place(first, query)?;
        tracing::info!(
            "Resolved \"{}\" to {} ({:.4}, {:.4})",
            query,
            place.display_name,
            place.lat,
            place.lon
        );
        Ok(place)
    }
}

fn candidate_to_place(candidate: NominatimCandidate, query: &str) -> Result<Place, GeoError> {
    let lat = parse_coordinate(&candidate.lat, "lat")?;
    let lon = parse_coordinate(&candidate.lon, "lon")?;

    // Nominatim always names its results, but don't show a blank heading if it doesn't
    let display_name = candidate
        .display_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| query.to_string());

    Ok(Place {
        display_name,
        lat,
        lon,
    })
}

fn parse_coordinate(raw: &str, field: &str) -> Result<f64, GeoError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| GeoError::MalformedResponse(format!("{field} is not a number: {raw:?}")))
}
