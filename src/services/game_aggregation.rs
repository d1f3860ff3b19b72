use super::{upcoming_window, validate_hours_ahead};
use crate::error::QueryError;
use crate::models::{GameView, OddsDocument, SpreadLine};
use crate::store::OddsStore;
use crate::utils::time::canonical_timestamp;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Upcoming games, in the order each game was first seen
#[derive(Debug, Clone, Default)]
pub struct GameListing {
    pub games: Vec<GameView>,
    /// The store hit its row cap; games near the end of the window may be
    /// missing bookmakers
    pub truncated: bool,
}

pub struct GameAggregationService {
    store: Arc<dyn OddsStore>,
    fetch_cap: usize,
}

impl GameAggregationService {
    pub fn new(store: Arc<dyn OddsStore>, fetch_cap: usize) -> Self {
        Self {
            store,
            fetch_cap: fetch_cap.max(1),
        }
    }

    pub async fn list_games(&self, hours_ahead: i64) -> Result<GameListing, QueryError> {
        self.list_games_at(hours_ahead, Utc::now()).await
    }

    pub async fn list_games_at(
        &self,
        hours_ahead: i64,
        now: DateTime<Utc>,
    ) -> Result<GameListing, QueryError> {
        let hours_ahead = validate_hours_ahead(hours_ahead)?;
        let window = upcoming_window(now, hours_ahead, self.fetch_cap);
        let scan = self.store.scan_window(&window).await?;
        let truncated = scan.hit_cap(&window);

        let games = group_by_game(scan.documents);
        if truncated {
            warn!(
                "Game scan hit the {} row cap; {} games may have partial bookmaker sets",
                self.fetch_cap,
                games.len()
            );
        } else {
            debug!("Grouped {} rows into {} games", scan.scanned, games.len());
        }

        Ok(GameListing { games, truncated })
    }
}

/// Group odds rows into one view per game id, keeping first-seen order of
/// games and arrival order of lines within each bookmaker
pub fn group_by_game(documents: Vec<OddsDocument>) -> Vec<GameView> {
    let mut games: IndexMap<String, GameView> = IndexMap::new();

    for OddsDocument { record, .. } in documents {
        let game = games
            .entry(record.game_id.clone())
            .or_insert_with(|| GameView {
                game_id: record.game_id.clone(),
                home_team: record.home_team.clone(),
                away_team: record.away_team.clone(),
                commence_time: canonical_timestamp(record.commence_time),
                bookmakers: IndexMap::new(),
            });

        game.bookmakers
            .entry(record.bookmaker)
            .or_default()
            .push(SpreadLine {
                team: record.team,
                point_spread: record.point_spread,
                odds: record.odds,
            });
    }

    games.into_values().collect()
}
