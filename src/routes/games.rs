use super::{truncated_header, AppState};
use crate::error::QueryError;
use crate::services::DEFAULT_HOURS_AHEAD;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct ListGamesParams {
    pub hours_ahead: Option<i64>,
}

/// Upcoming games, one entry per game with every bookmaker's lines grouped
async fn list_games(
    State(state): State<AppState>,
    params: Result<Query<ListGamesParams>, QueryRejection>,
) -> Result<impl IntoResponse, QueryError> {
    let Query(params) = params?;
    let hours_ahead = params.hours_ahead.unwrap_or(DEFAULT_HOURS_AHEAD);
    let listing = state.games.list_games(hours_ahead).await?;
    info!(
        "Returning {} games within {}h (truncated: {})",
        listing.games.len(),
        hours_ahead,
        listing.truncated
    );

    Ok((truncated_header(listing.truncated), Json(listing.games)))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/games", get(list_games))
}
