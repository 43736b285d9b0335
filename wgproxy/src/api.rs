//! HTTP surface for the failover proxy
//!
//! A single GET endpoint dispatches on the `endpoint` query parameter
//! (`/trending`, `/tracks/search`, `/tracks/{id}/stream`, anything else is a
//! passthrough), plus a no-op CORS preflight. Every response, success or
//! error, carries permissive cross-origin headers so browser players can
//! call the gateway directly.

use crate::error::Error;
use crate::hosts::HostSelector;
use crate::router::{FailoverRouter, RequestKind};
use axum::{
    extract::{Query, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

/// Shared state for the proxy API handlers
#[derive(Clone)]
pub struct ProxyState {
    router: Arc<FailoverRouter>,
}

impl ProxyState {
    pub fn new(router: Arc<FailoverRouter>) -> Self {
        Self { router }
    }

    fn hosts(&self) -> &Arc<HostSelector> {
        self.router.hosts()
    }
}

/// Error response body: `{ "error": ..., "details"?: ... }`
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Router serving the proxy surface (mount under e.g. `/api/audius`)
pub fn proxy_api_router(state: ProxyState) -> Router {
    Router::new()
        .route("/", get(proxy_get).options(proxy_preflight))
        .with_state(state)
}

const CORS_HEADERS: [(HeaderName, &str); 3] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS"),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
];

#[utoipa::path(
    options,
    path = "/",
    tag = "proxy",
    responses((status = 200, description = "CORS preflight"))
)]
pub async fn proxy_preflight() -> Response {
    (StatusCode::OK, CORS_HEADERS).into_response()
}

#[utoipa::path(
    get,
    path = "/",
    tag = "proxy",
    params(
        ("endpoint" = String, Query, description = "Logical upstream endpoint, e.g. /trending or /tracks/{id}/stream"),
        ("q" = Option<String>, Query, description = "Search query (required for /tracks/search)"),
        ("limit" = Option<usize>, Query, description = "Trending page size (default 20, capped at 100)")
    ),
    responses(
        (status = 200, description = "Upstream payload (JSON, or raw audio for stream endpoints)"),
        (status = 400, description = "Missing endpoint or search query", body = ErrorResponse),
        (status = 502, description = "Upstream returned unparseable JSON", body = ErrorResponse),
        (status = 503, description = "All upstream hosts exhausted", body = ErrorResponse),
        (status = 500, description = "Unexpected internal failure", body = ErrorResponse)
    )
)]
pub async fn proxy_get(
    State(state): State<ProxyState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let endpoint = match find_param(&params, "endpoint") {
        Some(endpoint) if !endpoint.is_empty() => endpoint.to_string(),
        _ => {
            return error_json(
                StatusCode::BAD_REQUEST,
                "Missing endpoint parameter",
                None,
            );
        }
    };

    match dispatch(&state, &endpoint, &params).await {
        Ok(response) => response,
        Err(err) => error_response(&state, err).await,
    }
}

async fn dispatch(
    state: &ProxyState,
    endpoint: &str,
    params: &[(String, String)],
) -> crate::error::Result<Response> {
    match RequestKind::from_endpoint(endpoint) {
        RequestKind::Trending => {
            let limit = find_param(params, "limit").and_then(|v| v.parse::<usize>().ok());
            let body = state.router.trending(limit).await?;
            Ok((StatusCode::OK, CORS_HEADERS, Json(body)).into_response())
        }
        RequestKind::Search => {
            let query = find_param(params, "q").unwrap_or_default();
            let body = state.router.search(query).await?;
            Ok((StatusCode::OK, CORS_HEADERS, Json(body)).into_response())
        }
        RequestKind::Stream => {
            let payload = state.router.stream(endpoint).await?;
            Ok((
                StatusCode::OK,
                CORS_HEADERS,
                [(header::CONTENT_TYPE, payload.content_type)],
                payload.body,
            )
                .into_response())
        }
        RequestKind::Passthrough => {
            let forwarded: Vec<(String, String)> = params
                .iter()
                .filter(|(name, _)| name != "endpoint")
                .cloned()
                .collect();
            let body = state.router.passthrough(endpoint, &forwarded).await?;
            Ok((StatusCode::OK, CORS_HEADERS, Json(body)).into_response())
        }
    }
}

/// Map a routing error to the HTTP taxonomy: 400 invalid input, 503
/// exhausted candidates, 502 malformed upstream payload, verbatim upstream
/// status for passthrough failures, 500 for anything unexpected (which also
/// invalidates the cached host so the next request re-discovers).
async fn error_response(state: &ProxyState, err: Error) -> Response {
    match err {
        Error::MissingQuery => {
            error_json(StatusCode::BAD_REQUEST, "Search query required", None)
        }
        Error::TrendingUnavailable { last_error } => error_json(
            StatusCode::SERVICE_UNAVAILABLE,
            "Trending unavailable from all hosts",
            Some(last_error),
        ),
        Error::SearchUnavailable => error_json(
            StatusCode::SERVICE_UNAVAILABLE,
            "Search failed on all hosts",
            None,
        ),
        Error::StreamUnavailable { last_error } => error_json(
            StatusCode::SERVICE_UNAVAILABLE,
            "Stream unavailable from all hosts",
            Some(last_error),
        ),
        Error::UpstreamStatus { status, body } => {
            let status =
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            error_json(status, &format!("API returned {}", status.as_u16()), Some(body))
        }
        Error::InvalidPayload { body } => error_json(
            StatusCode::BAD_GATEWAY,
            "Invalid JSON response from API",
            Some(body),
        ),
        err => {
            // An unexpected failure may mean the cached host has gone bad.
            error!(error = %err, "Proxy request failed unexpectedly");
            state.hosts().invalidate().await;
            error_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                &err.to_string(),
                Some(format!("{:?}", err)),
            )
        }
    }
}

fn error_json(status: StatusCode, message: &str, details: Option<String>) -> Response {
    (
        status,
        CORS_HEADERS,
        Json(ErrorResponse {
            error: message.to_string(),
            details,
        }),
    )
        .into_response()
}

fn find_param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}
