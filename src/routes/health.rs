use super::AppState;
use crate::utils::time::canonical_timestamp;
use axum::{response::Json, routing::get, Router};
use chrono::Utc;
use serde::Serialize;

const SERVICE_NAME: &str = "Sportsbook EV Analyzer API";

#[derive(Debug, Serialize)]
struct ServiceStatus {
    status: &'static str,
    service: &'static str,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
}

async fn root() -> Json<ServiceStatus> {
    Json(ServiceStatus {
        status: "healthy",
        service: SERVICE_NAME,
        timestamp: canonical_timestamp(Utc::now()),
    })
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: canonical_timestamp(Utc::now()),
    })
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(root))
}

pub fn api_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
