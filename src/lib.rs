pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

pub use error::*;
pub use models::*;
pub use services::*;
pub use store::*;
pub use utils::*;

use anyhow::Result;
use config::Settings;
use routes::AppState;
use std::sync::Arc;
use store::firestore::FirestoreStore;
use store::memory::MemoryStore;

/// Pick the odds store the settings ask for: a fixture file if one is
/// configured, otherwise Firestore (or its emulator)
pub fn build_store(settings: &Settings) -> Result<Arc<dyn OddsStore>> {
    if let Some(path) = &settings.odds_fixture_path {
        return Ok(Arc::new(MemoryStore::from_file(path)?));
    }

    let mut store = FirestoreStore::new(
        settings.firebase_project_id.clone(),
        settings.odds_collection.clone(),
    );
    if let Some(host) = &settings.firestore_emulator_host {
        store = store.with_base_url(format!("http://{}", host));
    } else if let Some(token) = &settings.firestore_access_token {
        store = store.with_access_token(token.clone());
    }

    Ok(Arc::new(store))
}

/// Wire both query services over one shared store
pub fn build_state(settings: &Settings, store: Arc<dyn OddsStore>) -> AppState {
    AppState {
        odds: Arc::new(OddsQueryService::new(store.clone(), settings.overscan_factor)),
        games: Arc::new(GameAggregationService::new(store, settings.games_fetch_cap)),
    }
}
