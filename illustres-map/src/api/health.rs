//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Module name ("illustres-map")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    pub portraits: usize,
    pub geo_traces: usize,
    /// Live event stream subscribers
    pub sse_clients: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;
    let reconciler = state.engine.reconciler();

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "illustres-map".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        portraits: reconciler.portraits().len(),
        geo_traces: reconciler.geo_traces().len(),
        sse_clients: state.event_bus.subscriber_count(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
