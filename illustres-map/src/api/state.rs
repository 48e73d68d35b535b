//! State inspection handlers
//!
//! GET /api/sidebar, /api/detail, /api/state, /api/map

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::presentation::{DetailPanel, PresentationSnapshot, SidebarEntry};
use crate::view::Scene;
use crate::AppState;

/// GET /api/sidebar response
#[derive(Debug, Serialize)]
pub struct SidebarResponse {
    pub entries: Vec<SidebarEntry>,
    pub selected: Option<String>,
}

/// GET /api/detail response
#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub detail: DetailPanel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub async fn get_sidebar(State(state): State<AppState>) -> Json<SidebarResponse> {
    let snapshot = state.engine.snapshot().await;
    Json(SidebarResponse {
        entries: snapshot.sidebar,
        selected: snapshot.selected,
    })
}

pub async fn get_detail(State(state): State<AppState>) -> Json<DetailResponse> {
    let snapshot = state.engine.snapshot().await;
    Json(DetailResponse {
        detail: snapshot.detail,
        message: snapshot.detail_message,
    })
}

pub async fn get_state(State(state): State<AppState>) -> Json<PresentationSnapshot> {
    Json(state.engine.snapshot().await)
}

/// Current scene of the map view
pub async fn get_map(State(state): State<AppState>) -> Json<Scene> {
    Json(state.scene.snapshot())
}

pub fn state_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sidebar", get(get_sidebar))
        .route("/api/detail", get(get_detail))
        .route("/api/state", get(get_state))
        .route("/api/map", get(get_map))
}
