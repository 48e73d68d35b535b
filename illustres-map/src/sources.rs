//! Open-data catalog client
//!
//! Fetches the portraits and geo-trace datasets. A failed fetch degrades to
//! an empty collection so rendering always proceeds.

use std::time::Duration;

use async_trait::async_trait;
use illustres_common::config::AppConfig;
use illustres_common::records::{geo_traces_from_body, portraits_from_body};
use illustres_common::{GeoTraceRecord, PortraitRecord};
use reqwest::Client;
use serde_json::Value;
use tracing::{info, warn};

use crate::geocoder::FetchError;

/// Provider of the two collections
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_portraits(&self) -> Vec<PortraitRecord>;
    async fn fetch_geo_traces(&self) -> Vec<GeoTraceRecord>;
}

/// HTTP client for the civic open-data catalog
pub struct OpenDataClient {
    client: Client,
    portraits_url: String,
    geo_traces_url: String,
}

impl OpenDataClient {
    pub fn new(
        portraits_url: impl Into<String>,
        geo_traces_url: impl Into<String>,
        user_agent: &str,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            client,
            portraits_url: portraits_url.into(),
            geo_traces_url: geo_traces_url.into(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, FetchError> {
        Self::new(
            config.portraits_url.clone(),
            config.geo_traces_url.clone(),
            &config.user_agent,
        )
    }

    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Api(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))
    }

    async fn fetch_or_empty(&self, dataset: &str, url: &str) -> Value {
        match self.fetch_json(url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(dataset = dataset, url = %url, "Dataset fetch failed: {}", e);
                Value::Null
            }
        }
    }
}

#[async_trait]
impl CatalogSource for OpenDataClient {
    async fn fetch_portraits(&self) -> Vec<PortraitRecord> {
        let body = self.fetch_or_empty("portraits", &self.portraits_url).await;
        let portraits = portraits_from_body(&body);
        info!(count = portraits.len(), "Portraits loaded");
        portraits
    }

    async fn fetch_geo_traces(&self) -> Vec<GeoTraceRecord> {
        let body = self.fetch_or_empty("geo-traces", &self.geo_traces_url).await;
        let traces = geo_traces_from_body(&body);
        let mappable = traces.iter().filter(|t| t.is_mappable()).count();
        info!(count = traces.len(), mappable, "Geo-traces loaded");
        traces
    }
}

/// Fixed in-memory collections
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    pub portraits: Vec<PortraitRecord>,
    pub geo_traces: Vec<GeoTraceRecord>,
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn fetch_portraits(&self) -> Vec<PortraitRecord> {
        self.portraits.clone()
    }

    async fn fetch_geo_traces(&self) -> Vec<GeoTraceRecord> {
        self.geo_traces.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_catalog_degrades_to_empty() {
        let client = OpenDataClient::new(
            "http://127.0.0.1:9/portraits",
            "http://127.0.0.1:9/geo",
            "TestApp/1.0",
        )
        .unwrap();

        assert!(client.fetch_portraits().await.is_empty());
        assert!(client.fetch_geo_traces().await.is_empty());
    }
}
