use super::{OddsStore, TimeWindow, WindowScan};
use crate::error::StoreError;
use crate::models::OddsDocument;
use crate::utils::data::load_documents_from_file;
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use tracing::info;

/// Store backed by an in-memory set of documents, usually loaded from a
/// JSON fixture file
pub struct MemoryStore {
    documents: Vec<OddsDocument>,
    source: String,
}

impl MemoryStore {
    pub fn new(documents: Vec<OddsDocument>) -> Self {
        Self {
            documents,
            source: "memory".to_string(),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let documents = load_documents_from_file(path)?;
        info!("Loaded {} odds documents from {}", documents.len(), path.display());
        Ok(Self {
            documents,
            source: path.display().to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl OddsStore for MemoryStore {
    async fn scan_window(&self, window: &TimeWindow) -> Result<WindowScan, StoreError> {
        let mut documents: Vec<OddsDocument> = self
            .documents
            .iter()
            .filter(|doc| window.contains(doc.record.commence_time))
            .cloned()
            .collect();

        // Stable sort keeps insertion order among equal start times
        documents.sort_by_key(|doc| doc.record.commence_time);
        documents.truncate(window.limit);

        Ok(WindowScan {
            scanned: documents.len(),
            documents,
        })
    }

    fn describe(&self) -> String {
        format!("fixture store ({}, {} documents)", self.source, self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OddsRecord;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn doc(id: &str, commence_time: DateTime<Utc>) -> OddsDocument {
        OddsDocument {
            id: id.to_string(),
            record: OddsRecord {
                game_id: format!("game-{}", id),
                sport: "basketball_nba".to_string(),
                home_team: "Home".to_string(),
                away_team: "Away".to_string(),
                commence_time,
                bookmaker: "fanduel".to_string(),
                team: "Home".to_string(),
                point_spread: -1.5,
                odds: -110,
                ev_percentage: None,
                is_positive_ev: false,
                last_update: None,
                ingested_at: None,
            },
        }
    }

    #[tokio::test]
    async fn test_window_bounds_and_order() {
        let now = Utc.with_ymd_and_hms(2024, 11, 2, 12, 0, 0).unwrap();
        let store = MemoryStore::new(vec![
            doc("late", now + Duration::hours(48)),
            doc("exactly-now", now),
            doc("past", now - Duration::hours(1)),
            doc("early", now + Duration::hours(1)),
            doc("outside", now + Duration::hours(49)),
        ]);

        let window = TimeWindow {
            after: now,
            until: now + Duration::hours(48),
            limit: 10,
        };
        let scan = store.scan_window(&window).await.unwrap();
        let ids: Vec<&str> = scan.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);
        assert_eq!(scan.scanned, 2);
        assert!(!scan.hit_cap(&window));
    }

    #[tokio::test]
    async fn test_cap() {
        let now = Utc.with_ymd_and_hms(2024, 11, 2, 12, 0, 0).unwrap();
        let store = MemoryStore::new(
            (1..=5)
                .map(|i| doc(&i.to_string(), now + Duration::hours(i)))
                .collect(),
        );

        let window = TimeWindow {
            after: now,
            until: now + Duration::hours(10),
            limit: 3,
        };
        let scan = store.scan_window(&window).await.unwrap();
        assert_eq!(scan.documents.len(), 3);
        assert!(scan.hit_cap(&window));
        assert_eq!(scan.documents[0].id, "1");
    }

    #[tokio::test]
    async fn test_sample_fixture_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/odds.sample.json");
        let store = MemoryStore::from_file(&path).unwrap();
        assert_eq!(store.len(), 3);
        assert!(store.describe().contains("3 documents"));

        let after = Utc.with_ymd_and_hms(2026, 10, 21, 12, 0, 0).unwrap();
        let window = TimeWindow {
            after,
            until: after + Duration::hours(12),
            limit: 500,
        };
        let scan = store.scan_window(&window).await.unwrap();
        assert_eq!(scan.documents.len(), 2);
        assert!(scan.documents.iter().all(|d| d.record.game_id == "a3f1c2e8d7b6"));
    }
}
