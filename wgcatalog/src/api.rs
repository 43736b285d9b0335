//! REST surface for the presence service

use crate::presence::PresenceService;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

/// Shared state for the presence routes
#[derive(Clone)]
pub struct PresenceState {
    service: Arc<dyn PresenceService>,
}

impl PresenceState {
    pub fn new(service: Arc<dyn PresenceService>) -> Self {
        PresenceState { service }
    }
}

/// Live listener count response
#[derive(Debug, Serialize, ToSchema)]
pub struct CountResponse {
    pub count: usize,
}

/// Build the presence API router
pub fn presence_api_router(state: PresenceState) -> Router {
    Router::new()
        .route("/join/{session_id}", post(presence_join))
        .route("/leave/{session_id}", post(presence_leave))
        .route("/count", get(presence_count))
        .with_state(state)
}

/// Register a listener session
#[utoipa::path(
    post,
    path = "/join/{session_id}",
    params(("session_id" = String, Path, description = "Opaque session identifier")),
    responses((status = 200, description = "Session joined", body = CountResponse)),
    tag = "presence"
)]
async fn presence_join(
    State(state): State<PresenceState>,
    Path(session_id): Path<String>,
) -> (StatusCode, Json<CountResponse>) {
    state.service.join(&session_id).await;
    let count = state.service.count().await;
    info!(session_id = %session_id, count, "Listener joined");
    (StatusCode::OK, Json(CountResponse { count }))
}

/// Remove a listener session
#[utoipa::path(
    post,
    path = "/leave/{session_id}",
    params(("session_id" = String, Path, description = "Opaque session identifier")),
    responses((status = 200, description = "Session left", body = CountResponse)),
    tag = "presence"
)]
async fn presence_leave(
    State(state): State<PresenceState>,
    Path(session_id): Path<String>,
) -> (StatusCode, Json<CountResponse>) {
    state.service.leave(&session_id).await;
    let count = state.service.count().await;
    info!(session_id = %session_id, count, "Listener left");
    (StatusCode::OK, Json(CountResponse { count }))
}

/// Current listener count
#[utoipa::path(
    get,
    path = "/count",
    responses((status = 200, description = "Live listener count", body = CountResponse)),
    tag = "presence"
)]
async fn presence_count(State(state): State<PresenceState>) -> Json<CountResponse> {
    let count = state.service.count().await;
    Json(CountResponse { count })
}
