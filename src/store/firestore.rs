use super::{OddsStore, TimeWindow, WindowScan};
use crate::error::StoreError;
use crate::models::{OddsDocument, OddsRecord, Timestamp};
use crate::utils::time::canonical_timestamp;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";
const TIME_FIELD: &str = "commence_time";

/// Typed value as Firestore's REST API encodes it
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
enum Value {
    NullValue(()),
    BooleanValue(bool),
    // 64-bit integers travel as decimal strings
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(serde_json::Value),
    ArrayValue(serde_json::Value),
    MapValue(serde_json::Value),
}

/// One element of a runQuery response stream
#[derive(Debug, Deserialize)]
struct RunQueryResponse {
    document: Option<FirestoreDocument>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: HashMap<String, Value>,
}

#[derive(Debug, Error, PartialEq)]
enum FieldError {
    #[error("missing field `{0}`")]
    Missing(&'static str),
    #[error("field `{0}` has an unexpected type")]
    WrongType(&'static str),
}

struct Fields<'a>(&'a HashMap<String, Value>);

impl<'a> Fields<'a> {
    fn get(&self, field: &'static str) -> Option<&'a Value> {
        match self.0.get(field) {
            None | Some(Value::NullValue(())) => None,
            Some(value) => Some(value),
        }
    }

    fn required(&self, field: &'static str) -> Result<&'a Value, FieldError> {
        self.get(field).ok_or(FieldError::Missing(field))
    }

    fn string(&self, field: &'static str) -> Result<String, FieldError> {
        match self.required(field)? {
            Value::StringValue(s) => Ok(s.clone()),
            _ => Err(FieldError::WrongType(field)),
        }
    }

    fn float(&self, field: &'static str) -> Result<Option<f64>, FieldError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::DoubleValue(v)) => Ok(Some(*v)),
            Some(Value::IntegerValue(s)) => s
                .parse::<i64>()
                .map(|v| Some(v as f64))
                .map_err(|_| FieldError::WrongType(field)),
            Some(_) => Err(FieldError::WrongType(field)),
        }
    }

    fn integer(&self, field: &'static str) -> Result<i32, FieldError> {
        match self.required(field)? {
            Value::IntegerValue(s) => s.parse().map_err(|_| FieldError::WrongType(field)),
            Value::DoubleValue(v) if v.fract() == 0.0 => {
                i32::try_from(*v as i64).map_err(|_| FieldError::WrongType(field))
            }
            _ => Err(FieldError::WrongType(field)),
        }
    }

    fn boolean(&self, field: &'static str) -> Result<Option<bool>, FieldError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::BooleanValue(b)) => Ok(Some(*b)),
            Some(_) => Err(FieldError::WrongType(field)),
        }
    }

    fn timestamp(&self, field: &'static str) -> Result<Option<Timestamp>, FieldError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::TimestampValue(s)) | Some(Value::StringValue(s)) => {
                Ok(Some(Timestamp::from_text(s)))
            }
            Some(_) => Err(FieldError::WrongType(field)),
        }
    }

    fn instant(&self, field: &'static str) -> Result<DateTime<Utc>, FieldError> {
        self.timestamp(field)?
            .ok_or(FieldError::Missing(field))?
            .instant()
            .ok_or(FieldError::WrongType(field))
    }
}

fn decode_record(fields: &HashMap<String, Value>) -> Result<OddsRecord, FieldError> {
    let f = Fields(fields);
    Ok(OddsRecord {
        game_id: f.string("game_id")?,
        sport: f.string("sport")?,
        home_team: f.string("home_team")?,
        away_team: f.string("away_team")?,
        commence_time: f.instant("commence_time")?,
        bookmaker: f.string("bookmaker")?,
        team: f.string("team")?,
        point_spread: f.float("point_spread")?.ok_or(FieldError::Missing("point_spread"))?,
        odds: f.integer("odds")?,
        ev_percentage: f.float("ev_percentage")?,
        is_positive_ev: f.boolean("is_positive_ev")?.unwrap_or(false),
        last_update: f.timestamp("last_update")?,
        ingested_at: f.timestamp("ingested_at")?,
    })
}

/// The document id is the last segment of the resource name
fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Client for the Firestore REST API, scoped to one odds collection
pub struct FirestoreStore {
    base_url: String,
    project_id: String,
    collection: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl FirestoreStore {
    pub fn new(project_id: String, collection: String) -> Self {
        Self {
            base_url: FIRESTORE_BASE_URL.to_string(),
            project_id,
            collection,
            access_token: None,
            client: reqwest::Client::new(),
        }
    }

    /// Point at a different host, e.g. the local emulator
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn run_query_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents:runQuery",
            self.base_url, self.project_id
        )
    }

    fn structured_query(&self, window: &TimeWindow) -> serde_json::Value {
        json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.collection }],
                "where": {
                    "compositeFilter": {
                        "op": "AND",
                        "filters": [
                            {
                                "fieldFilter": {
                                    "field": { "fieldPath": TIME_FIELD },
                                    "op": "GREATER_THAN",
                                    "value": { "timestampValue": canonical_timestamp(window.after) }
                                }
                            },
                            {
                                "fieldFilter": {
                                    "field": { "fieldPath": TIME_FIELD },
                                    "op": "LESS_THAN_OR_EQUAL",
                                    "value": { "timestampValue": canonical_timestamp(window.until) }
                                }
                            }
                        ]
                    }
                },
                "orderBy": [{
                    "field": { "fieldPath": TIME_FIELD },
                    "direction": "ASCENDING"
                }],
                "limit": window.limit
            }
        })
    }
}

#[async_trait]
impl OddsStore for FirestoreStore {
    async fn scan_window(&self, window: &TimeWindow) -> Result<WindowScan, StoreError> {
        let mut request = self
            .client
            .post(self.run_query_url())
            .json(&self.structured_query(window));
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let rows: Vec<RunQueryResponse> =
            serde_json::from_str(&body).map_err(|e| StoreError::Decode(e.to_string()))?;

        let mut scan = WindowScan::default();
        for doc in rows.into_iter().filter_map(|row| row.document) {
            scan.scanned += 1;
            let id = document_id(&doc.name).to_string();
            match decode_record(&doc.fields) {
                Ok(record) => scan.documents.push(OddsDocument { id, record }),
                Err(e) => warn!("Skipping odds document {}: {}", id, e),
            }
        }

        debug!(
            "Firestore returned {} rows ({} usable) for window {} .. {}",
            scan.scanned,
            scan.documents.len(),
            window.after,
            window.until
        );
        Ok(scan)
    }

    fn describe(&self) -> String {
        format!(
            "firestore ({}, project {}, collection {})",
            self.base_url, self.project_id, self.collection
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use wiremock::matchers::{header, method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fields_json() -> serde_json::Value {
        json!({
            "game_id": { "stringValue": "evt-1" },
            "sport": { "stringValue": "basketball_nba" },
            "home_team": { "stringValue": "Los Angeles Lakers" },
            "away_team": { "stringValue": "Phoenix Suns" },
            "commence_time": { "timestampValue": "2024-11-03T03:00:00Z" },
            "bookmaker": { "stringValue": "betmgm" },
            "team": { "stringValue": "Phoenix Suns" },
            "point_spread": { "doubleValue": 2.5 },
            "odds": { "integerValue": "-112" },
            "ev_percentage": { "nullValue": null },
            "is_positive_ev": { "booleanValue": false },
            "last_update": { "timestampValue": "2024-11-02T18:45:10.123456Z" },
            "ingested_at": { "timestampValue": "2024-11-02T18:46:00Z" }
        })
    }

    fn window() -> TimeWindow {
        let now = Utc.with_ymd_and_hms(2024, 11, 2, 12, 0, 0).unwrap();
        TimeWindow {
            after: now,
            until: now + Duration::hours(48),
            limit: 500,
        }
    }

    #[test]
    fn test_decode_record() {
        let fields: HashMap<String, Value> = serde_json::from_value(fields_json()).unwrap();
        let record = decode_record(&fields).unwrap();
        assert_eq!(record.game_id, "evt-1");
        assert_eq!(record.odds, -112);
        assert_eq!(record.point_spread, 2.5);
        assert_eq!(record.ev_percentage, None);
        assert_eq!(
            record.commence_time,
            Utc.with_ymd_and_hms(2024, 11, 3, 3, 0, 0).unwrap()
        );
        assert_eq!(
            record.last_update.map(|t| t.canonical()).as_deref(),
            Some("2024-11-02T18:45:10.123456Z")
        );
    }

    #[test]
    fn test_decode_record_integer_spread_and_missing_field() {
        let mut raw = fields_json();
        raw["point_spread"] = json!({ "integerValue": "-3" });
        raw["ev_percentage"] = json!({ "doubleValue": 4.2 });
        let fields: HashMap<String, Value> = serde_json::from_value(raw.clone()).unwrap();
        let record = decode_record(&fields).unwrap();
        assert_eq!(record.point_spread, -3.0);
        assert_eq!(record.ev_percentage, Some(4.2));

        raw.as_object_mut().unwrap().remove("game_id");
        let fields: HashMap<String, Value> = serde_json::from_value(raw).unwrap();
        assert_eq!(
            decode_record(&fields).unwrap_err(),
            FieldError::Missing("game_id")
        );
    }

    #[test]
    fn test_whole_double_odds_must_fit() {
        let mut raw = fields_json();
        raw["odds"] = json!({ "doubleValue": 150.0 });
        let fields: HashMap<String, Value> = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(decode_record(&fields).unwrap().odds, 150);

        raw["odds"] = json!({ "doubleValue": 3.0e12 });
        let fields: HashMap<String, Value> = serde_json::from_value(raw).unwrap();
        assert_eq!(
            decode_record(&fields).unwrap_err(),
            FieldError::WrongType("odds")
        );
    }

    #[test]
    fn test_document_id() {
        assert_eq!(
            document_id("projects/p/databases/(default)/documents/odds/AbC123"),
            "AbC123"
        );
    }

    #[test]
    fn test_structured_query() {
        let store = FirestoreStore::new("proj".to_string(), "odds".to_string());
        let body = store.structured_query(&window());
        let query = &body["structuredQuery"];
        assert_eq!(query["from"][0]["collectionId"], "odds");
        assert_eq!(query["limit"], 500);
        assert_eq!(query["orderBy"][0]["direction"], "ASCENDING");
        let filters = &query["where"]["compositeFilter"]["filters"];
        assert_eq!(filters[0]["fieldFilter"]["op"], "GREATER_THAN");
        assert_eq!(
            filters[0]["fieldFilter"]["value"]["timestampValue"],
            "2024-11-02T12:00:00Z"
        );
        assert_eq!(filters[1]["fieldFilter"]["op"], "LESS_THAN_OR_EQUAL");
        assert_eq!(
            filters[1]["fieldFilter"]["value"]["timestampValue"],
            "2024-11-04T12:00:00Z"
        );
    }

    #[tokio::test]
    async fn test_scan_window_skips_malformed_rows() {
        let server = MockServer::start().await;
        let mut broken = fields_json();
        broken.as_object_mut().unwrap().remove("bookmaker");

        Mock::given(method("POST"))
            .and(path_regex(r"^/v1/projects/proj/databases/.+/documents:runQuery$"))
            .and(header("authorization", "Bearer token-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "readTime": "2024-11-02T12:00:00Z" },
                {
                    "document": {
                        "name": "projects/proj/databases/(default)/documents/odds/doc-a",
                        "fields": fields_json()
                    },
                    "readTime": "2024-11-02T12:00:00Z"
                },
                {
                    "document": {
                        "name": "projects/proj/databases/(default)/documents/odds/doc-b",
                        "fields": broken
                    },
                    "readTime": "2024-11-02T12:00:00Z"
                }
            ])))
            .mount(&server)
            .await;

        let store = FirestoreStore::new("proj".to_string(), "odds".to_string())
            .with_base_url(server.uri())
            .with_access_token("token-123");

        let scan = store.scan_window(&window()).await.unwrap();
        assert_eq!(scan.scanned, 2);
        assert_eq!(scan.documents.len(), 1);
        assert_eq!(scan.documents[0].id, "doc-a");
    }

    #[tokio::test]
    async fn test_scan_window_surfaces_store_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string("FAILED_PRECONDITION: The query requires an index"),
            )
            .mount(&server)
            .await;

        let store = FirestoreStore::new("proj".to_string(), "odds".to_string())
            .with_base_url(server.uri());

        match store.scan_window(&window()).await {
            Err(StoreError::Status { status, body }) => {
                assert_eq!(status, 400);
                assert!(body.contains("requires an index"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }
}
