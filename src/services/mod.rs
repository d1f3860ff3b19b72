pub mod game_aggregation;
pub mod odds_query;

pub use game_aggregation::{GameAggregationService, GameListing};
pub use odds_query::{OddsQuery, OddsQueryService, OddsSelection};

use crate::error::QueryError;
use crate::store::TimeWindow;
use chrono::{DateTime, Duration, Utc};

pub const MIN_HOURS_AHEAD: i64 = 1;
pub const MAX_HOURS_AHEAD: i64 = 168; // one week
pub const DEFAULT_HOURS_AHEAD: i64 = 48;

pub const MIN_LIMIT: i64 = 1;
pub const MAX_LIMIT: i64 = 500;
pub const DEFAULT_LIMIT: i64 = 100;

pub(crate) fn validate_hours_ahead(hours_ahead: i64) -> Result<i64, QueryError> {
    if (MIN_HOURS_AHEAD..=MAX_HOURS_AHEAD).contains(&hours_ahead) {
        Ok(hours_ahead)
    } else {
        Err(QueryError::InvalidHoursAhead {
            value: hours_ahead,
            min: MIN_HOURS_AHEAD,
            max: MAX_HOURS_AHEAD,
        })
    }
}

pub(crate) fn validate_limit(limit: i64) -> Result<usize, QueryError> {
    if (MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
        Ok(limit as usize)
    } else {
        Err(QueryError::InvalidLimit {
            value: limit,
            min: MIN_LIMIT,
            max: MAX_LIMIT,
        })
    }
}

/// Games that haven't started yet and start within `hours_ahead` of `now`
pub(crate) fn upcoming_window(now: DateTime<Utc>, hours_ahead: i64, limit: usize) -> TimeWindow {
    TimeWindow {
        after: now,
        until: now + Duration::hours(hours_ahead),
        limit,
    }
}
