//! Geocoding relay (OpenStreetMap Nominatim)
//!
//! Resolves place names to coordinates and coordinates back to a
//! city/state/country. Requests are passed straight through to Nominatim:
//! no retries, caching or rate limiting happen here.

use crate::input::parse_leading_number;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const SEARCH_LIMIT: u32 = 5;
const UNKNOWN: &str = "Unknown";
const DEFAULT_COUNTRY: &str = "India";

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("geocoding service returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

/// Forward geocoding hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Reverse geocoding result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverseLocation {
    pub city: String,
    pub state: String,
    pub country: String,
    pub display: Option<String>,
}

// Nominatim wire types (coordinates arrive as strings)

#[derive(Debug, Deserialize)]
struct SearchHit {
    display_name: String,
    lat: String,
    lon: String,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReverseHit {
    display_name: Option<String>,
    #[serde(default)]
    address: Option<Address>,
}

/// First three comma-separated parts of a Nominatim display name, rejoined
/// with ", ". Parts keep their own whitespace, so Nominatim's ", " separators
/// come back doubled.
fn short_name(display_name: &str) -> String {
    display_name.split(',').take(3).collect::<Vec<_>>().join(", ")
}

fn to_place(hit: SearchHit) -> Option<Place> {
    let lat = parse_leading_number(&hit.lat).filter(|v| v.is_finite())?;
    let lon = parse_leading_number(&hit.lon).filter(|v| v.is_finite())?;
    Some(Place { name: short_name(&hit.display_name), lat, lon })
}

fn to_reverse_location(hit: ReverseHit) -> ReverseLocation {
    let address = hit.address.unwrap_or_default();
    ReverseLocation {
        city: address
            .city
            .or(address.town)
            .or(address.village)
            .unwrap_or_else(|| UNKNOWN.to_string()),
        state: address.state.unwrap_or_else(|| UNKNOWN.to_string()),
        country: address.country.unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
        display: hit.display_name,
    }
}

/// Thin Nominatim client
#[derive(Debug, Clone)]
pub struct GeocodingClient {
    client: reqwest::Client,
    base_url: String,
    country_codes: String,
}

impl GeocodingClient {
    pub fn new(base_url: &str, user_agent: &str, country_codes: &str) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            country_codes: country_codes.to_string(),
        })
    }

    /// Look up a place name; at most five hits
    pub async fn search(&self, query: &str) -> Result<Vec<Place>, GeocodeError> {
        let url = format!("{}/search", self.base_url);
        let limit = SEARCH_LIMIT.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("limit", limit.as_str()),
                ("countrycodes", self.country_codes.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!("Nominatim search for '{}' returned {}", query, response.status());
            return Err(GeocodeError::Status(response.status()));
        }

        let hits: Vec<SearchHit> = response.json().await?;
        tracing::debug!("Nominatim search '{}' returned {} hits", query, hits.len());
        Ok(hits.into_iter().filter_map(to_place).collect())
    }

    /// Resolve coordinates to a city/state/country
    pub async fn reverse(&self, lat: f64, lon: f64) -> Result<ReverseLocation, GeocodeError> {
        let url = format!("{}/reverse", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("lat", lat.to_string()), ("lon", lon.to_string()), ("format", "json".to_string())])
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!("Nominatim reverse for {},{} returned {}", lat, lon, response.status());
            return Err(GeocodeError::Status(response.status()));
        }

        let hit: ReverseHit = response.json().await?;
        Ok(to_reverse_location(hit))
    }
}
