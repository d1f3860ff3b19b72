use crate::utils::time::{canonical_timestamp, format_time_until, is_odds_fresh};
use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A timestamp as it was found in the store
///
/// Most rows carry real instants, but older ingestion runs wrote some
/// fields as free text. Text that isn't RFC 3339 is passed through as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Instant(DateTime<Utc>),
    Text(String),
}

impl Timestamp {
    /// Parse text into an instant when possible
    pub fn from_text(text: &str) -> Self {
        match DateTime::parse_from_rfc3339(text) {
            Ok(dt) => Timestamp::Instant(dt.with_timezone(&Utc)),
            Err(_) => Timestamp::Text(text.to_string()),
        }
    }

    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Instant(dt) => Some(*dt),
            Timestamp::Text(_) => None,
        }
    }

    pub fn canonical(&self) -> String {
        match self {
            Timestamp::Instant(dt) => canonical_timestamp(*dt),
            Timestamp::Text(text) => text.clone(),
        }
    }
}

/// One spread line offered by one bookmaker for one side of one NBA game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsRecord {
    pub game_id: String,
    pub sport: String,
    pub home_team: String,
    pub away_team: String,
    pub commence_time: DateTime<Utc>,
    pub bookmaker: String,
    pub team: String,
    pub point_spread: f64,
    pub odds: i32, // American odds format (e.g., -110, +150)
    /// `None` means EV was never computed for this line, not that it is zero
    #[serde(default)]
    pub ev_percentage: Option<f64>,
    #[serde(default)]
    pub is_positive_ev: bool,
    #[serde(default)]
    pub last_update: Option<Timestamp>,
    #[serde(default)]
    pub ingested_at: Option<Timestamp>,
}

/// An odds record together with its store-assigned document id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsDocument {
    pub id: String,
    #[serde(flatten)]
    pub record: OddsRecord,
}

impl OddsDocument {
    /// One-line summary, e.g. for terminal output
    pub fn format(&self, now: DateTime<Utc>, max_age: Duration) -> String {
        let r = &self.record;
        let last_update = r.last_update.as_ref().and_then(Timestamp::instant);
        let fresh = is_odds_fresh(last_update, max_age, now);
        let ev = match r.ev_percentage {
            Some(ev) => format!("{:+.2}% EV", ev),
            None => "EV n/a".to_string(),
        };
        format!(
            "{} @ {} (in {}) | {} {:+.1} ({:+}) on {} | {}{}{}",
            r.away_team,
            r.home_team,
            format_time_until(r.commence_time, now),
            r.team,
            r.point_spread,
            r.odds,
            r.bookmaker,
            ev,
            if r.is_positive_ev { " [+EV]" } else { "" },
            if fresh { "" } else { " [stale]" }
        )
    }
}

/// Response shape for a single odds record, timestamps rendered as text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsView {
    pub id: String,
    pub game_id: String,
    pub sport: String,
    pub home_team: String,
    pub away_team: String,
    pub commence_time: String,
    pub bookmaker: String,
    pub team: String,
    pub point_spread: f64,
    pub odds: i32,
    pub ev_percentage: Option<f64>,
    pub is_positive_ev: bool,
    pub last_update: Option<String>,
    pub ingested_at: Option<String>,
}

impl From<OddsDocument> for OddsView {
    fn from(doc: OddsDocument) -> Self {
        let OddsDocument { id, record } = doc;
        Self {
            id,
            game_id: record.game_id,
            sport: record.sport,
            home_team: record.home_team,
            away_team: record.away_team,
            commence_time: canonical_timestamp(record.commence_time),
            bookmaker: record.bookmaker,
            team: record.team,
            point_spread: record.point_spread,
            odds: record.odds,
            ev_percentage: record.ev_percentage,
            is_positive_ev: record.is_positive_ev,
            last_update: record.last_update.as_ref().map(Timestamp::canonical),
            ingested_at: record.ingested_at.as_ref().map(Timestamp::canonical),
        }
    }
}

/// Spread line for one side, as listed under a bookmaker in a [`GameView`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadLine {
    pub team: String,
    pub point_spread: f64,
    pub odds: i32,
}

/// One upcoming game with every bookmaker's lines grouped under it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameView {
    pub game_id: String,
    pub home_team: String,
    pub away_team: String,
    pub commence_time: String,
    pub bookmakers: IndexMap<String, Vec<SpreadLine>>,
}

impl GameView {
    pub fn format(&self, now: DateTime<Utc>) -> String {
        let starts = match DateTime::parse_from_rfc3339(&self.commence_time) {
            Ok(dt) => format!("in {}", format_time_until(dt.with_timezone(&Utc), now)),
            Err(_) => self.commence_time.clone(),
        };
        let books: Vec<String> = self
            .bookmakers
            .iter()
            .map(|(bookmaker, lines)| {
                let sides: Vec<String> = lines
                    .iter()
                    .map(|l| format!("{} {:+.1} ({:+})", l.team, l.point_spread, l.odds))
                    .collect();
                format!("{}: {}", bookmaker, sides.join(", "))
            })
            .collect();
        format!(
            "{} @ {} ({}) | {}",
            self.away_team,
            self.home_team,
            starts,
            books.join(" | ")
        )
    }
}

/// Secondary filters applied in-process after the time-window scan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OddsFilter {
    pub bookmaker: Option<String>,
    pub team: Option<String>,
    pub min_ev: Option<f64>,
}

impl OddsFilter {
    /// Bookmaker, then team, then minimum EV
    pub fn matches(&self, record: &OddsRecord) -> bool {
        if let Some(bookmaker) = &self.bookmaker {
            if &record.bookmaker != bookmaker {
                return false;
            }
        }

        if let Some(team) = &self.team {
            if &record.team != team {
                return false;
            }
        }

        if let Some(min_ev) = self.min_ev {
            match record.ev_percentage {
                Some(ev) if ev >= min_ev => {}
                _ => return false,
            }
        }

        true
    }
}
