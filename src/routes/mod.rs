//! HTTP routes

mod games;
mod health;
mod odds;

use crate::error::QueryError;
use crate::services::{GameAggregationService, OddsQueryService};
use axum::{
    extract::rejection::QueryRejection,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

/// Set to "true" when a listing may be missing rows because the store cap
/// was reached
pub const TRUNCATED_HEADER: HeaderName = HeaderName::from_static("x-results-truncated");

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub odds: Arc<OddsQueryService>,
    pub games: Arc<GameAggregationService>,
}

/// Build the full router with CORS and request tracing
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([TRUNCATED_HEADER]);

    Router::new()
        .merge(health::routes())
        .nest(
            "/api",
            Router::new()
                .merge(health::api_routes())
                .merge(odds::routes())
                .merge(games::routes()),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Error response, `{"detail": "..."}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let status = if self.is_validation() {
            warn!("Rejected request: {}", self);
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            error!("Store query failed: {}", self);
            StatusCode::SERVICE_UNAVAILABLE
        };

        (
            status,
            Json(ErrorResponse {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<QueryRejection> for QueryError {
    fn from(rejection: QueryRejection) -> Self {
        QueryError::InvalidParams(rejection.body_text())
    }
}

fn truncated_header(truncated: bool) -> [(HeaderName, HeaderValue); 1] {
    let value = if truncated { "true" } else { "false" };
    [(TRUNCATED_HEADER, HeaderValue::from_static(value))]
}
