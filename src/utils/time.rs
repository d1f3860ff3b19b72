use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Odds older than this are considered stale
pub const DEFAULT_FRESHNESS_MINUTES: i64 = 30;

/// Render an instant the way every response does: RFC 3339 in UTC with a
/// `Z` suffix, fractional seconds only when present
pub fn canonical_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Check if odds are recent enough to be actionable
pub fn is_odds_fresh(
    last_update: Option<DateTime<Utc>>,
    max_age: Duration,
    now: DateTime<Utc>,
) -> bool {
    match last_update {
        Some(updated) => now - updated < max_age,
        None => false,
    }
}

/// Human-readable time until a game starts, e.g. "1d 4h", "3h 15m", "42m"
pub fn format_time_until(commence_time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = commence_time - now;
    if delta <= Duration::zero() {
        return "started".to_string();
    }

    let days = delta.num_days();
    let hours = delta.num_hours() % 24;
    let minutes = delta.num_minutes() % 60;

    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}
