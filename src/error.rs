use thiserror::Error;

/// Failures talking to the document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request to document store failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("document store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode document store response: {0}")]
    Decode(String),
}

/// Errors surfaced by the query services
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("hours_ahead must be between {min} and {max}, got {value}")]
    InvalidHoursAhead { value: i64, min: i64, max: i64 },

    #[error("limit must be between {min} and {max}, got {value}")]
    InvalidLimit { value: i64, min: i64, max: i64 },

    #[error("{0}")]
    InvalidParams(String),

    #[error("Query failed. You may need to create a Firestore index. Error: {0}")]
    Store(#[from] StoreError),
}

impl QueryError {
    /// Validation errors are the caller's fault; store errors are not
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            QueryError::InvalidHoursAhead { .. }
                | QueryError::InvalidLimit { .. }
                | QueryError::InvalidParams(_)
        )
    }
}
