//! illustres-map library interface
//!
//! Map engine for the Femmes Illustres walking tour: presentation state,
//! search resolution, geocoding fallback and the HTTP/SSE surface that drives
//! a browser map widget.

pub mod api;
pub mod engine;
pub mod error;
pub mod events;
pub mod geocoder;
pub mod presentation;
pub mod search;
pub mod sources;
pub mod sweep;
pub mod view;

pub use crate::error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};

use crate::engine::MapEngine;
use crate::events::EventBus;
use crate::view::SceneHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MapEngine>,
    /// Map commands for SSE clients
    pub event_bus: EventBus,
    /// Live scene of the map view
    pub scene: SceneHandle,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(engine: Arc<MapEngine>, event_bus: EventBus, scene: SceneHandle) -> Self {
        Self {
            engine,
            event_bus,
            scene,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::search_routes())
        .merge(api::state_routes())
        .route("/events", get(api::map_event_stream))
        .merge(api::health_routes())
        .with_state(state)
}
