use super::{upcoming_window, validate_hours_ahead, validate_limit, DEFAULT_HOURS_AHEAD, DEFAULT_LIMIT};
use crate::error::QueryError;
use crate::models::{OddsDocument, OddsFilter, OddsView};
use crate::store::OddsStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// Parameters for listing odds
#[derive(Debug, Clone, PartialEq)]
pub struct OddsQuery {
    pub filter: OddsFilter,
    pub hours_ahead: i64,
    pub limit: i64,
}

impl Default for OddsQuery {
    fn default() -> Self {
        Self {
            filter: OddsFilter::default(),
            hours_ahead: DEFAULT_HOURS_AHEAD,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Odds matching a query, soonest first
#[derive(Debug, Clone, Default)]
pub struct OddsSelection {
    pub documents: Vec<OddsDocument>,
    /// Fewer than `limit` matched but the store hit its row cap, so more
    /// matching rows may exist beyond what was scanned
    pub truncated: bool,
}

impl OddsSelection {
    pub fn into_views(self) -> Vec<OddsView> {
        self.documents.into_iter().map(OddsView::from).collect()
    }
}

/// Time-window scan followed by in-process filtering and capping
pub struct OddsQueryService {
    store: Arc<dyn OddsStore>,
    overscan_factor: usize,
}

impl OddsQueryService {
    pub fn new(store: Arc<dyn OddsStore>, overscan_factor: usize) -> Self {
        Self {
            store,
            overscan_factor: overscan_factor.max(1),
        }
    }

    pub async fn list_odds(&self, query: &OddsQuery) -> Result<OddsSelection, QueryError> {
        self.list_odds_at(query, Utc::now()).await
    }

    pub async fn list_odds_at(
        &self,
        query: &OddsQuery,
        now: DateTime<Utc>,
    ) -> Result<OddsSelection, QueryError> {
        let hours_ahead = validate_hours_ahead(query.hours_ahead)?;
        let limit = validate_limit(query.limit)?;

        // The store can only filter on time, so fetch extra to make up for
        // rows the secondary filters drop
        let scan_limit = limit.saturating_mul(self.overscan_factor);
        let window = upcoming_window(now, hours_ahead, scan_limit);
        let scan = self.store.scan_window(&window).await?;
        let hit_cap = scan.hit_cap(&window);
        let scanned = scan.scanned;

        let mut documents = Vec::with_capacity(limit.min(scan.documents.len()));
        for doc in scan.documents {
            if !query.filter.matches(&doc.record) {
                continue;
            }
            documents.push(doc);
            if documents.len() >= limit {
                break;
            }
        }

        let truncated = documents.len() < limit && hit_cap;
        if truncated {
            info!(
                "Overscan exhausted: {} of {} requested odds after scanning {} rows",
                documents.len(),
                limit,
                scanned
            );
        } else {
            debug!("Returning {} odds from {} scanned rows", documents.len(), scanned);
        }

        Ok(OddsSelection {
            documents,
            truncated,
        })
    }
}
