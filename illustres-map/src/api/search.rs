//! User input handlers
//!
//! POST /api/search, POST /api/sidebar/select, POST /api/markers/activate

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::presentation::DetailPanel;
use crate::search::SearchOutcome;
use crate::AppState;

/// POST /api/search request
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

/// Sidebar / marker activation request
#[derive(Debug, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

/// Outcome plus the detail panel it left behind
#[derive(Debug, Serialize)]
pub struct ResolutionResponse {
    pub outcome: SearchOutcome,
    pub detail: DetailPanel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// POST /api/markers/activate response
#[derive(Debug, Serialize)]
pub struct ActivationResponse {
    pub detail: DetailPanel,
    pub selected: Option<String>,
}

async fn respond(state: &AppState, outcome: SearchOutcome) -> ResolutionResponse {
    let snapshot = state.engine.snapshot().await;
    ResolutionResponse {
        outcome,
        message: snapshot.detail.message(),
        detail: snapshot.detail,
    }
}

/// POST /api/search
///
/// Short queries are not an HTTP error: they come back as a `rejected`
/// outcome with the matching message.
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Json<ResolutionResponse> {
    let outcome = state.engine.search(&request.query).await;
    Json(respond(&state, outcome).await)
}

/// POST /api/sidebar/select
pub async fn select_sidebar_entry(
    State(state): State<AppState>,
    Json(request): Json<NameRequest>,
) -> ApiResult<Json<ResolutionResponse>> {
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }
    let outcome = state.engine.activate_sidebar_entry(&request.name).await;
    Ok(Json(respond(&state, outcome).await))
}

/// POST /api/markers/activate
pub async fn activate_marker(
    State(state): State<AppState>,
    Json(request): Json<NameRequest>,
) -> ApiResult<Json<ActivationResponse>> {
    if !state.engine.activate_marker(&request.name).await {
        return Err(ApiError::NotFound(format!("No marker for '{}'", request.name)));
    }
    let snapshot = state.engine.snapshot().await;
    Ok(Json(ActivationResponse {
        detail: snapshot.detail,
        selected: snapshot.selected,
    }))
}

pub fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/api/search", post(search))
        .route("/api/sidebar/select", post(select_sidebar_entry))
        .route("/api/markers/activate", post(activate_marker))
}
