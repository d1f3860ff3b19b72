use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const DEFAULT_SERVICE_ACCOUNT_PATH: &str = "../../config/firebase-service-account.json";
const MAX_OVERSCAN_FACTOR: usize = 100;

/// Runtime settings, read from the environment (and `.env` if present)
#[derive(Debug, Clone)]
pub struct Settings {
    pub firebase_project_id: String,
    pub firebase_service_account_path: PathBuf,
    pub firestore_access_token: Option<String>,
    /// `host:port` of a Firestore emulator; no auth is sent when set
    pub firestore_emulator_host: Option<String>,
    pub odds_collection: String,
    /// When set, odds are served from this JSON file instead of Firestore
    pub odds_fixture_path: Option<PathBuf>,
    pub api_host: String,
    pub api_port: u16,
    pub environment: String,
    pub overscan_factor: usize,
    pub games_fetch_cap: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            firebase_project_id: String::new(),
            firebase_service_account_path: PathBuf::from(DEFAULT_SERVICE_ACCOUNT_PATH),
            firestore_access_token: None,
            firestore_emulator_host: None,
            odds_collection: "odds".to_string(),
            odds_fixture_path: None,
            api_host: "0.0.0.0".to_string(),
            api_port: 8000,
            environment: "development".to_string(),
            overscan_factor: 5,
            games_fetch_cap: 500,
        }
    }
}

#[derive(Deserialize)]
struct ServiceAccount {
    project_id: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup, so tests don't touch the process env
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let firebase_service_account_path = var("FIREBASE_SERVICE_ACCOUNT_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.firebase_service_account_path);
        let odds_fixture_path = var("ODDS_FIXTURE_PATH").map(PathBuf::from);

        let firebase_project_id = match var("FIREBASE_PROJECT_ID") {
            Some(id) => id,
            // A fixture store never talks to Firestore, so a project isn't required
            None if odds_fixture_path.is_some() => String::new(),
            None => read_project_id(&firebase_service_account_path)?,
        };

        let overscan_factor = parse_or(&var, "ODDS_OVERSCAN_FACTOR", defaults.overscan_factor)?;
        if !(1..=MAX_OVERSCAN_FACTOR).contains(&overscan_factor) {
            return Err(anyhow!(
                "ODDS_OVERSCAN_FACTOR must be between 1 and {}",
                MAX_OVERSCAN_FACTOR
            ));
        }
        let games_fetch_cap = parse_or(&var, "GAMES_FETCH_CAP", defaults.games_fetch_cap)?;
        if games_fetch_cap == 0 {
            return Err(anyhow!("GAMES_FETCH_CAP must be at least 1"));
        }

        Ok(Self {
            firebase_project_id,
            firebase_service_account_path,
            firestore_access_token: var("FIRESTORE_ACCESS_TOKEN"),
            firestore_emulator_host: var("FIRESTORE_EMULATOR_HOST"),
            odds_collection: var("ODDS_COLLECTION").unwrap_or(defaults.odds_collection),
            odds_fixture_path,
            api_host: var("API_HOST").unwrap_or(defaults.api_host),
            api_port: parse_or(&var, "API_PORT", defaults.api_port)?,
            environment: var("NODE_ENV").unwrap_or(defaults.environment),
            overscan_factor,
            games_fetch_cap,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{} has invalid value {:?}: {}", key, raw, e)),
        None => Ok(default),
    }
}

/// Fall back to the project named in the service account credentials
fn read_project_id(path: &Path) -> Result<String> {
    let json = std::fs::read_to_string(path).with_context(|| {
        format!(
            "FIREBASE_PROJECT_ID not set and service account file {} could not be read",
            path.display()
        )
    })?;
    let account: ServiceAccount =
        serde_json::from_str(&json).context("Failed to parse service account file")?;
    Ok(account.project_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[("FIREBASE_PROJECT_ID", "ev-prod")])).unwrap();
        assert_eq!(settings.firebase_project_id, "ev-prod");
        assert_eq!(settings.api_port, 8000);
        assert_eq!(settings.odds_collection, "odds");
        assert_eq!(settings.overscan_factor, 5);
        assert_eq!(settings.games_fetch_cap, 500);
        assert_eq!(settings.environment, "development");
        assert_eq!(settings.bind_address(), "0.0.0.0:8000");
    }

    #[test]
    fn test_project_id_from_service_account() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sa.json");
        std::fs::write(&path, r#"{"type":"service_account","project_id":"ev-dev"}"#).unwrap();

        let settings = Settings::from_lookup(lookup(&[(
            "FIREBASE_SERVICE_ACCOUNT_PATH",
            path.to_str().unwrap(),
        )]))
        .unwrap();
        assert_eq!(settings.firebase_project_id, "ev-dev");
    }

    #[test]
    fn test_fixture_does_not_need_project() {
        let settings =
            Settings::from_lookup(lookup(&[("ODDS_FIXTURE_PATH", "fixtures/odds.json")])).unwrap();
        assert_eq!(settings.firebase_project_id, "");
        assert_eq!(
            settings.odds_fixture_path,
            Some(PathBuf::from("fixtures/odds.json"))
        );
    }

    #[test]
    fn test_invalid_values() {
        let err = Settings::from_lookup(lookup(&[
            ("FIREBASE_PROJECT_ID", "p"),
            ("API_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("API_PORT"));

        assert!(Settings::from_lookup(lookup(&[
            ("FIREBASE_PROJECT_ID", "p"),
            ("ODDS_OVERSCAN_FACTOR", "0"),
        ]))
        .is_err());

        let err = Settings::from_lookup(lookup(&[
            ("FIREBASE_PROJECT_ID", "p"),
            ("ODDS_OVERSCAN_FACTOR", "18446744073709551615"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("ODDS_OVERSCAN_FACTOR"));
    }
}
