//! Document store gateway
//!
//! The services only ever ask the store one question: which odds rows have a
//! commence time inside a window, soonest first, capped at some count.

pub mod firestore;
pub mod memory;

use crate::error::StoreError;
use crate::models::OddsDocument;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Rows with `after < commence_time <= until`, ascending, at most `limit`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub after: DateTime<Utc>,
    pub until: DateTime<Utc>,
    pub limit: usize,
}

impl TimeWindow {
    pub fn contains(&self, commence_time: DateTime<Utc>) -> bool {
        commence_time > self.after && commence_time <= self.until
    }
}

/// Result of a window scan
#[derive(Debug, Clone, Default)]
pub struct WindowScan {
    pub documents: Vec<OddsDocument>,
    /// Rows the store returned, including ones dropped as malformed
    pub scanned: usize,
}

impl WindowScan {
    /// Whether the store stopped because it hit the row cap
    pub fn hit_cap(&self, window: &TimeWindow) -> bool {
        self.scanned >= window.limit
    }
}

#[async_trait]
pub trait OddsStore: Send + Sync {
    async fn scan_window(&self, window: &TimeWindow) -> Result<WindowScan, StoreError>;

    /// Short description for startup logs
    fn describe(&self) -> String;
}
