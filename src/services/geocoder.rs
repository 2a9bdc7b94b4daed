use crate::constants::{GEOCODER_USER_AGENT, MAX_GEOCODE_CACHE_ENTRIES, NOMINATIM_REVERSE_URL};
use crate::error::{AppError, Result};
use crate::models::Waypoint;
use moka::future::Cache;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Cache keys use coordinates rounded to 5 decimals (~1 m).
const CACHE_KEY_PRECISION: u32 = 5;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NominatimAddress {
    pub road: Option<String>,
    pub house_number: Option<String>,
    pub suburb: Option<String>,
    pub neighbourhood: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub municipality: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NominatimResponse {
    pub display_name: Option<String>,
    #[serde(default)]
    pub address: NominatimAddress,
}

/// Reverse geocoding for history cards, backed by Nominatim.
#[derive(Clone)]
pub struct Geocoder {
    client: Client,
    base_url: String,
    cache: Cache<(i64, i64), String>,
}

impl Geocoder {
    pub fn new(base_url: Option<String>, cache_ttl_seconds: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(cache_ttl_seconds))
            .max_capacity(MAX_GEOCODE_CACHE_ENTRIES)
            .build();

        Geocoder {
            client: Client::new(),
            base_url: base_url.unwrap_or_else(|| NOMINATIM_REVERSE_URL.to_string()),
            cache,
        }
    }

    /// Human-readable address for a position. Lookup failures degrade to
    /// the coordinates themselves and are not cached.
    pub async fn reverse(&self, position: Waypoint) -> String {
        let key = cache_key(&position);
        if let Some(address) = self.cache.get(&key).await {
            tracing::debug!("Geocode cache hit for {}", position);
            return address;
        }

        match self.lookup(position).await {
            Ok(address) => {
                self.cache.insert(key, address.clone()).await;
                address
            }
            Err(e) => {
                tracing::warn!("Reverse geocoding failed for {}: {}", position, e);
                coordinates_label(&position)
            }
        }
    }

    async fn lookup(&self, position: Waypoint) -> Result<String> {
        let response = self
            .client
            .get(&self.base_url)
            .header(reqwest::header::USER_AGENT, GEOCODER_USER_AGENT)
            .query(&[
                ("format", "json".to_string()),
                ("lat", position.lat.to_string()),
                ("lon", position.lng.to_string()),
                ("accept-language", "pt-BR".to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Geocoding(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Geocoding(format!("HTTP {}", response.status())));
        }

        let data: NominatimResponse = response
            .json()
            .await
            .map_err(|e| AppError::Geocoding(format!("Failed to parse response: {}", e)))?;

        Ok(format_address(&data, &position))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn cache_key(position: &Waypoint) -> (i64, i64) {
    let rounded = position.round(CACHE_KEY_PRECISION);
    let scale = 10_f64.powi(CACHE_KEY_PRECISION as i32);
    (
        (rounded.lat * scale).round() as i64,
        (rounded.lng * scale).round() as i64,
    )
}

/// `lat, lng` with four decimals
pub fn coordinates_label(position: &Waypoint) -> String {
    format!("{:.4}, {:.4}", position.lat, position.lng)
}

/// `road, number - suburb, city`, skipping missing parts. The city is left
/// out when it repeats the suburb. Falls back to `display_name`, and to the
/// coordinates when Nominatim knows nothing about the place.
pub fn format_address(data: &NominatimResponse, position: &Waypoint) -> String {
    let Some(display_name) = data.display_name.as_deref().filter(|s| !s.is_empty()) else {
        return coordinates_label(position);
    };

    let address = &data.address;
    let suburb = non_empty(&address.suburb).or(non_empty(&address.neighbourhood));
    let city = non_empty(&address.city)
        .or(non_empty(&address.town))
        .or(non_empty(&address.municipality));

    let mut formatted = String::new();
    if let Some(road) = non_empty(&address.road) {
        formatted.push_str(road);
        if let Some(number) = non_empty(&address.house_number) {
            formatted.push_str(", ");
            formatted.push_str(number);
        }
    }
    if let Some(suburb) = suburb {
        if !formatted.is_empty() {
            formatted.push_str(" - ");
        }
        formatted.push_str(suburb);
    }
    if let Some(city) = city.filter(|c| Some(*c) != suburb) {
        if !formatted.is_empty() {
            formatted.push_str(", ");
        }
        formatted.push_str(city);
    }

    if formatted.is_empty() {
        display_name.to_string()
    } else {
        formatted
    }
}
