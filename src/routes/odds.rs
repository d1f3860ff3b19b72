use super::{truncated_header, AppState};
use crate::error::QueryError;
use crate::models::OddsFilter;
use crate::services::{OddsQuery, DEFAULT_HOURS_AHEAD, DEFAULT_LIMIT};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

/// Query parameters for listing odds
#[derive(Debug, Deserialize)]
pub struct ListOddsParams {
    /// Exact bookmaker key
    pub bookmaker: Option<String>,
    /// Exact team name
    pub team: Option<String>,
    /// Minimum EV percentage
    pub min_ev: Option<f64>,
    /// Only show games starting within this many hours
    pub hours_ahead: Option<i64>,
    /// Maximum number of results
    pub limit: Option<i64>,
}

impl From<ListOddsParams> for OddsQuery {
    fn from(params: ListOddsParams) -> Self {
        Self {
            filter: OddsFilter {
                bookmaker: params.bookmaker,
                team: params.team,
                min_ev: params.min_ev,
            },
            hours_ahead: params.hours_ahead.unwrap_or(DEFAULT_HOURS_AHEAD),
            limit: params.limit.unwrap_or(DEFAULT_LIMIT),
        }
    }
}

/// NBA spread odds starting soonest first
async fn list_odds(
    State(state): State<AppState>,
    params: Result<Query<ListOddsParams>, QueryRejection>,
) -> Result<impl IntoResponse, QueryError> {
    let Query(params) = params?;
    info!("Listing odds with params: {:?}", params);

    let selection = state.odds.list_odds(&params.into()).await?;
    let truncated = selection.truncated;
    let records = selection.into_views();
    info!("Returning {} odds (truncated: {})", records.len(), truncated);

    Ok((truncated_header(truncated), Json(records)))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/odds", get(list_odds))
}
