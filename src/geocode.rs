//! OpenStreetMap Nominatim lookups.
//!
//! Two helpers around the report, neither used by the orchestrator itself:
//!
//! * [`Geocoder::reverse`] turns trusted coordinates into an address label
//!   (see [`crate::request::TrustedLocation::with_label`]).
//! * [`Geocoder::search`] resolves a report's `locationName` to coordinates,
//!   e.g. to drop a pin on a map.
//!
//! Both return `Ok(None)` when Nominatim answers but finds nothing.
//! Nominatim's usage policy requires an identifying `User-Agent` and at most
//! one request per second; rate limiting is the caller's concern.

use crate::request::Language;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Public Nominatim instance.
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

const USER_AGENT: &str = concat!("geocognition/", env!("CARGO_PKG_VERSION"));

/// Geocoding failures. A lookup that simply finds nothing is not an error.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("geocoding service returned HTTP {0}")]
    Status(u16),

    #[error("unexpected geocoding payload: {0}")]
    Payload(String),
}

/// Forward-geocoding hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
}

/// Nominatim client.
#[derive(Debug, Clone)]
pub struct Geocoder {
    client: reqwest::Client,
    base_url: String,
}

impl Geocoder {
    /// Client for the public Nominatim instance.
    pub fn new(timeout_secs: u64) -> Result<Self, GeocodeError> {
        Self::with_base_url(DEFAULT_NOMINATIM_URL, timeout_secs)
    }

    /// Client for a self-hosted instance.
    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Address label for a coordinate, localised to `language` when
    /// Nominatim has it.
    pub async fn reverse(
        &self,
        latitude: f64,
        longitude: f64,
        language: Language,
    ) -> Result<Option<String>, GeocodeError> {
        let body = self
            .get(
                "reverse",
                &[
                    ("format", "json".to_string()),
                    ("lat", latitude.to_string()),
                    ("lon", longitude.to_string()),
                    ("zoom", "18".to_string()),
                    ("addressdetails", "1".to_string()),
                ],
                language,
            )
            .await?;
        parse_reverse(&body)
    }

    /// Best match for a place name.
    pub async fn search(
        &self,
        name: &str,
        language: Language,
    ) -> Result<Option<Place>, GeocodeError> {
        if name.trim().is_empty() {
            return Ok(None);
        }
        let body = self
            .get(
                "search",
                &[
                    ("q", name.to_string()),
                    ("format", "json".to_string()),
                    ("limit", "1".to_string()),
                ],
                language,
            )
            .await?;
        parse_search(&body)
    }

    async fn get(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
        language: Language,
    ) -> Result<String, GeocodeError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("nominatim {}: {:?}", endpoint, query);
        let response = self
            .client
            .get(&url)
            .query(query)
            .header(reqwest::header::ACCEPT_LANGUAGE, accept_language(language))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            warn!("nominatim {} returned {}", endpoint, status);
            return Err(GeocodeError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

fn accept_language(language: Language) -> String {
    match language {
        Language::En => "en".to_string(),
        other => format!("{},en;q=0.9", other.code()),
    }
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

fn parse_reverse(body: &str) -> Result<Option<String>, GeocodeError> {
    let parsed: ReverseResponse =
        serde_json::from_str(body).map_err(|e| GeocodeError::Payload(e.to_string()))?;
    if let Some(err) = parsed.error {
        debug!("nominatim reverse: {}", err);
    }
    Ok(parsed.display_name.filter(|n| !n.trim().is_empty()))
}

fn parse_search(body: &str) -> Result<Option<Place>, GeocodeError> {
    let hits: Vec<SearchHit> =
        serde_json::from_str(body).map_err(|e| GeocodeError::Payload(e.to_string()))?;
    let Some(hit) = hits.into_iter().next() else {
        return Ok(None);
    };
    let latitude = hit
        .lat
        .parse()
        .map_err(|_| GeocodeError::Payload(format!("bad latitude '{}'", hit.lat)))?;
    let longitude = hit
        .lon
        .parse()
        .map_err(|_| GeocodeError::Payload(format!("bad longitude '{}'", hit.lon)))?;
    Ok(Some(Place {
        latitude,
        longitude,
        display_name: hit.display_name,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_hit_and_miss() {
        let hit = r#"{"place_id": 1, "display_name": "Calle Real, Bárcena Mayor, Cantabria, España"}"#;
        assert_eq!(
            parse_reverse(hit).unwrap().as_deref(),
            Some("Calle Real, Bárcena Mayor, Cantabria, España")
        );

        let miss = r#"{"error": "Unable to geocode"}"#;
        assert_eq!(parse_reverse(miss).unwrap(), None);
    }

    #[test]
    fn search_hit_and_miss() {
        let hit = r#"[{"lat": "43.1467", "lon": "-4.2322", "display_name": "Bárcena Mayor"}]"#;
        let place = parse_search(hit).unwrap().unwrap();
        assert_eq!(place.latitude, 43.1467);
        assert_eq!(place.longitude, -4.2322);
        assert_eq!(place.display_name, "Bárcena Mayor");

        assert_eq!(parse_search("[]").unwrap(), None);
    }

    #[test]
    fn malformed_payloads_are_errors() {
        assert!(matches!(
            parse_search(r#"{"not": "a list"}"#),
            Err(GeocodeError::Payload(_))
        ));
        assert!(matches!(
            parse_search(r#"[{"lat": "north", "lon": "0"}]"#),
            Err(GeocodeError::Payload(_))
        ));
    }

    #[test]
    fn accept_language_header() {
        assert_eq!(accept_language(Language::En), "en");
        assert_eq!(accept_language(Language::Es), "es,en;q=0.9");
    }

    #[tokio::test]
    async fn blank_search_skips_the_network() {
        let geocoder = Geocoder::with_base_url("http://127.0.0.1:9", 1).unwrap();
        assert_eq!(geocoder.search("   ", Language::En).await.unwrap(), None);
    }
}
