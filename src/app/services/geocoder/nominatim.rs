//! Nominatim search client
//!
//! Queries `GET {base_url}/search?q=<town>, <region>&format=json` and takes the
//! first ranked place. Latitude and longitude are kept exactly as the service
//! returns them (JSON strings).

use super::{Geocoder, ResolutionFailure, town_query};
use crate::app::models::{CoordinateValue, TownCoordinates};
use crate::config::GeocoderConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// A single candidate in a Nominatim search response
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: CoordinateValue,
    lon: CoordinateValue,
    #[serde(default)]
    display_name: Option<String>,
}

/// Geocoder backed by a Nominatim-compatible search endpoint
#[derive(Debug)]
pub struct NominatimGeocoder {
    http: reqwest::Client,
    base_url: String,
    region: String,
    request_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl NominatimGeocoder {
    /// Create a client from geocoder settings
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::http("Failed to build geocoding HTTP client", e))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            region: config.region.clone(),
            request_interval: Duration::from_millis(config.request_interval_ms),
            last_request: Mutex::new(None),
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Wait until the minimum interval since the previous request has passed
    async fn wait_for_slot(&self) {
        if self.request_interval.is_zero() {
            return;
        }

        // Held across the sleep so concurrent lookups queue up behind each other
        let mut last_request = self.last_request.lock().await;
        if let Some(previous) = *last_request {
            let elapsed = previous.elapsed();
            if elapsed < self.request_interval {
                tokio::time::sleep(self.request_interval - elapsed).await;
            }
        }
        *last_request = Some(Instant::now());
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, town: &str) -> std::result::Result<TownCoordinates, ResolutionFailure> {
        let query = town_query(town, &self.region);
        let url = format!("{}/search", self.base_url);

        self.wait_for_slot().await;
        debug!("Geocoding '{}'", query);

        let response = self
            .http
            .get(&url)
            .query(&[("q", query.as_str()), ("format", "json")])
            .send()
            .await
            .map_err(|e| ResolutionFailure::Transport(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ResolutionFailure::HttpStatus(status.as_u16()));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| ResolutionFailure::InvalidResponse(e.to_string()))?;

        let first = places
            .into_iter()
            .next()
            .ok_or(ResolutionFailure::NoResults)?;

        trace!(
            "First result for '{}': {}",
            query,
            first.display_name.as_deref().unwrap_or("<unnamed>")
        );

        Ok(TownCoordinates {
            latitude: first.lat,
            longitude: first.lon,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn config_for(base_url: String) -> GeocoderConfig {
        GeocoderConfig {
            base_url,
            request_interval_ms: 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_first_result_is_returned_verbatim() {
        let server = MockServer::start_async().await;
        let search = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/search")
                    .query_param("q", "Hartford, Connecticut")
                    .query_param("format", "json");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!([
                        {"lat": "41.7658", "lon": "-72.6734", "display_name": "Hartford, CT"},
                        {"lat": "41.0", "lon": "-73.0", "display_name": "Somewhere else"}
                    ]));
            })
            .await;

        let geocoder = NominatimGeocoder::new(&config_for(server.base_url())).unwrap();
        let coordinates = geocoder.geocode("Hartford").await.unwrap();

        search.assert_async().await;
        assert_eq!(coordinates, TownCoordinates::new("41.7658", "-72.6734"));
    }

    #[tokio::test]
    async fn test_empty_result_is_no_results() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!([]));
            })
            .await;

        let geocoder = NominatimGeocoder::new(&config_for(server.base_url())).unwrap();
        let result = geocoder.geocode("Atlantis").await;

        assert_eq!(result, Err(ResolutionFailure::NoResults));
    }

    #[tokio::test]
    async fn test_non_200_is_http_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search");
                then.status(429).body("slow down");
            })
            .await;

        let geocoder = NominatimGeocoder::new(&config_for(server.base_url())).unwrap();
        let result = geocoder.geocode("Hartford").await;

        assert_eq!(result, Err(ResolutionFailure::HttpStatus(429)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search");
                then.status(200)
                    .header("content-type", "application/json")
                    .body("{\"error\": \"unexpected\"}");
            })
            .await;

        let geocoder = NominatimGeocoder::new(&config_for(server.base_url())).unwrap();
        let result = geocoder.geocode("Hartford").await;

        assert!(matches!(result, Err(ResolutionFailure::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_failure() {
        let config = GeocoderConfig {
            timeout_secs: 2,
            ..config_for("http://127.0.0.1:1".to_string())
        };
        let geocoder = NominatimGeocoder::new(&config).unwrap();
        let result = geocoder.geocode("Hartford").await;

        assert!(matches!(result, Err(ResolutionFailure::Transport(_))));
    }

    #[tokio::test]
    async fn test_requests_are_spaced_by_interval() {
        let server = MockServer::start_async().await;
        let search = server
            .mock_async(|when, then| {
                when.method(GET).path("/search");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!([{"lat": "1", "lon": "2"}]));
            })
            .await;

        let config = GeocoderConfig {
            request_interval_ms: 150,
            ..config_for(server.base_url())
        };
        let geocoder = NominatimGeocoder::new(&config).unwrap();

        let start = Instant::now();
        geocoder.geocode("A").await.unwrap();
        geocoder.geocode("B").await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(150));
        assert_eq!(search.hits_async().await, 2);
    }
}
