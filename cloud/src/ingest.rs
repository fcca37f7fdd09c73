//! The ingestion endpoint: one request in, at most one row out.
//!
//! The handler is stateless. It validates the payload completely before it
//! touches the store, so a malformed request never leaves a partial row.

use std::fmt;

use psychro_model::{IngestPayload, TableRow};
use serde::{Deserialize, Serialize};

use crate::store::{StoreError, TableStore};

/// Environment variable holding the target table name.
pub const TABLE_ENV: &str = "DDB_TABLE";

pub const SUCCESS_MESSAGE: &str = "Data correctly written";
pub const ERROR_MESSAGE: &str = "Error processing the request";

/// The request envelope; the payload arrives as a JSON string in `body`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct IngestEvent {
    pub body: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct IngestResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// JSON-encoded message string.
    pub body: String,
}

impl IngestResponse {
    fn new(status_code: u16, message: &str) -> Self {
        Self {
            status_code,
            body: serde_json::Value::from(message).to_string(),
        }
    }

    pub fn ok() -> Self {
        Self::new(200, SUCCESS_MESSAGE)
    }

    pub fn error() -> Self {
        Self::new(500, ERROR_MESSAGE)
    }
}

#[derive(Debug)]
pub enum IngestError {
    Event(serde_json::Error),
    Payload(serde_json::Error),
    Store(StoreError),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event(err) => write!(f, "malformed event: {err}"),
            Self::Payload(err) => write!(f, "malformed payload: {err}"),
            Self::Store(err) => write!(f, "write failed: {err}"),
        }
    }
}

impl std::error::Error for IngestError {}

impl From<StoreError> for IngestError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

/// Parse a payload and write it as one row.
pub fn ingest<S: TableStore>(store: &mut S, body: &str) -> Result<TableRow, IngestError> {
    let payload: IngestPayload = serde_json::from_str(body).map_err(IngestError::Payload)?;
    let row = TableRow::from(payload);

    store.put_item(row.clone())?;
    log::debug!("Stored row {}", row.timestamp);

    Ok(row)
}

/// Handle one event. Never fails: every error is logged and answered with 500.
pub fn handle<S: TableStore>(store: &mut S, event: &IngestEvent) -> IngestResponse {
    match ingest(store, &event.body) {
        Ok(_) => IngestResponse::ok(),
        Err(e) => {
            log::error!("Error: {}", e);
            IngestResponse::error()
        }
    }
}

/// [`handle`] for a raw event document.
pub fn handle_json<S: TableStore>(store: &mut S, event: &str) -> IngestResponse {
    match serde_json::from_str::<IngestEvent>(event) {
        Ok(event) => handle(store, &event),
        Err(e) => {
            log::error!("Error: {}", IngestError::Event(e));
            IngestResponse::error()
        }
    }
}
