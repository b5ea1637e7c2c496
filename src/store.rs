use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::types::{non_blank, NewRecord, Record, RecordId};

/// Columns requested on every read.
pub const SELECT_FIELDS: &str = "id,name,category,location,description";

/// Opaque create/read access to the hosted record store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every record, in the store's order.
    async fn select_all(&self) -> Result<Vec<Record>, StoreError>;

    /// Persist one record. `Ok(None)` means the write was confirmed but no
    /// row was echoed back.
    async fn insert(&self, record: &NewRecord) -> Result<Option<Record>, StoreError>;
}

/// Client for a PostgREST-style table endpoint (`/rest/v1/<table>`).
pub struct RestStore {
    client: reqwest::Client,
    config: StoreConfig,
}

impl RestStore {
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("business-directory/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.config.base_url, self.config.table)
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.table_url())
            .header("apikey", &self.config.access_key)
            .bearer_auth(&self.config.access_key)
    }
}

#[async_trait]
impl RecordStore for RestStore {
    async fn select_all(&self) -> Result<Vec<Record>, StoreError> {
        let response = self
            .request(reqwest::Method::GET)
            .query(&[("select", SELECT_FIELDS), ("order", "created_at.desc")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        let rows: Vec<StoreRow> = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        let total = rows.len();
        let records: Vec<Record> = rows.into_iter().filter_map(StoreRow::into_record).collect();
        if records.len() < total {
            tracing::warn!("Skipped {} malformed rows", total - records.len());
        }
        tracing::debug!("Fetched {} records", records.len());
        Ok(records)
    }

    async fn insert(&self, record: &NewRecord) -> Result<Option<Record>, StoreError> {
        let response = self
            .request(reqwest::Method::POST)
            .header("Prefer", "return=representation")
            .json(record)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        let echoed: Value =
            serde_json::from_str(&body).map_err(|e| StoreError::Decode(e.to_string()))?;
        let row = match echoed {
            Value::Array(mut rows) if !rows.is_empty() => rows.swap_remove(0),
            Value::Array(_) | Value::Null => return Ok(None),
            single => single,
        };
        match serde_json::from_value::<StoreRow>(row) {
            Ok(row) => Ok(row.into_record()),
            Err(e) => {
                tracing::warn!("Ignoring unreadable insert echo: {e}");
                Ok(None)
            }
        }
    }
}

/// Build an `Api` error, preferring the service's own `message` field.
async fn error_from_response(response: reqwest::Response) -> StoreError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .or_else(|| non_blank(&body))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
    StoreError::Api {
        status: status.as_u16(),
        message,
    }
}

/// One row as it comes over the wire. Every column is optional here;
/// rows that break the record invariants are dropped in `into_record`.
#[derive(Debug, Deserialize)]
struct StoreRow {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl StoreRow {
    fn into_record(self) -> Option<Record> {
        let id = match self.id {
            Some(Value::String(s)) => Some(RecordId(s)),
            Some(Value::Number(n)) => Some(RecordId(n.to_string())),
            _ => None,
        };
        Some(Record {
            id,
            name: non_blank(self.name.as_deref()?)?,
            category: non_blank(self.category.as_deref()?)?,
            location: non_blank(self.location.as_deref()?)?,
            description: self.description.as_deref().and_then(non_blank),
        })
    }
}
