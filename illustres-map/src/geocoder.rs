//! Geocoding fallback client
//!
//! Resolves free text to a coordinate through a Nominatim-compatible search
//! service. Lookups never fail towards the caller: empty input, no result,
//! bad status, transport or parse errors all come back as `None`.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use illustres_common::config::AppConfig;
use illustres_common::Coordinate;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Failure inside a single lookup; logged, never returned to callers
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}")]
    Api(u16),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Text-to-coordinate resolution
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Address lookup constrained to the configured city
    async fn resolve_address(&self, text: &str) -> Option<Coordinate>;

    /// Unconstrained place lookup on the raw text
    async fn search_place(&self, text: &str) -> Option<Coordinate>;
}

/// One search hit; coordinates come as decimal strings
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

/// Nominatim search client
pub struct NominatimClient {
    client: Client,
    base_url: String,
    city: String,
    /// `None` when throttling is disabled
    rate_limiter: Option<DefaultDirectRateLimiter>,
}

impl NominatimClient {
    /// # Arguments
    /// * `base_url` - Service root, e.g. `https://nominatim.openstreetmap.org`
    /// * `city` - Suffix appended to address lookups
    /// * `user_agent` - Client identification (required by the usage policy)
    /// * `min_interval` - Minimum spacing between requests; zero disables it
    pub fn new(
        base_url: impl Into<String>,
        city: impl Into<String>,
        user_agent: &str,
        min_interval: Duration,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let rate_limiter = Quota::with_period(min_interval)
            .map(|quota| RateLimiter::direct(quota.allow_burst(NonZeroU32::MIN)));

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            city: city.into(),
            rate_limiter,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, FetchError> {
        Self::new(
            config.geocoder_url.clone(),
            config.geocoder_city.clone(),
            &config.user_agent,
            config.geocoder_min_interval,
            config.geocoder_timeout,
        )
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
    }

    /// Query text for an address lookup
    fn city_query(&self, text: &str) -> String {
        if self.city.is_empty() {
            text.to_string()
        } else {
            format!("{} {}", text, self.city)
        }
    }

    /// Single request, first result only
    async fn lookup(&self, query: &str) -> Result<Option<Coordinate>, FetchError> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        debug!(query = %query, "Querying geocoder");

        let response = self
            .client
            .get(self.search_url())
            .query(&[("format", "json"), ("limit", "1"), ("q", query)])
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Api(status.as_u16()));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        let Some(first) = places.into_iter().next() else {
            return Ok(None);
        };

        let lat = first.lat.trim().parse::<f64>();
        let lon = first.lon.trim().parse::<f64>();
        let coordinate = match (lat, lon) {
            (Ok(lat), Ok(lon)) => Coordinate::new(lat, lon),
            _ => {
                return Err(FetchError::Parse(format!(
                    "non-numeric coordinates '{}', '{}'",
                    first.lat, first.lon
                )))
            }
        };

        if let Some(c) = &coordinate {
            info!(
                query = %query,
                place = %first.display_name.as_deref().unwrap_or("?"),
                lat = c.lat,
                lon = c.lon,
                "Geocoded"
            );
        }
        Ok(coordinate)
    }

    async fn lookup_or_none(&self, query: &str) -> Option<Coordinate> {
        match self.lookup(query).await {
            Ok(found) => {
                if found.is_none() {
                    debug!(query = %query, "Geocoder returned no result");
                }
                found
            }
            Err(e) => {
                warn!(query = %query, "Geocoding failed: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn resolve_address(&self, text: &str) -> Option<Coordinate> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.lookup_or_none(&self.city_query(text)).await
    }

    async fn search_place(&self, text: &str) -> Option<Coordinate> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.lookup_or_none(text).await
    }
}
