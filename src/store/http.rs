use super::{check_columns, Collection, RecordStore, Row, StoreError, StoreErrorKind};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Url;
use serde_json::Value as JsonValue;
use std::time::Duration;

/// Hosted PostgREST-style endpoint (`{base}/rest/v1/{table}`), authenticated
/// with the project access key.
pub struct HttpStore {
    base_url: String,
    key: String,
    client: Client,
}

impl HttpStore {
    pub fn new(base_url: &str, key: &str, timeout: Duration) -> Result<Self, StoreError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| StoreError::new(StoreErrorKind::Invalid, format!("store url: {}", e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::new(StoreErrorKind::Network, e.to_string()))?;
        Ok(Self {
            base_url,
            key: key.to_string(),
            client,
        })
    }

    fn table_url(&self, collection: Collection) -> Result<Url, StoreError> {
        Url::parse(&format!("{}/rest/v1/{}", self.base_url, collection.table()))
            .map_err(|e| StoreError::new(StoreErrorKind::Invalid, e.to_string()))
    }

    fn list_url(&self, collection: Collection) -> Result<Url, StoreError> {
        let mut url = self.table_url(collection)?;
        url.query_pairs_mut().append_pair("select", "*");
        Ok(url)
    }

    fn id_url(&self, collection: Collection, id: &str) -> Result<Url, StoreError> {
        let mut url = self.table_url(collection)?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{}", id));
        Ok(url)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", self.key))
    }

    fn send(&self, req: RequestBuilder) -> Result<Response, StoreError> {
        let resp = self
            .authed(req)
            .send()
            .map_err(|e| StoreError::new(StoreErrorKind::Network, e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().unwrap_or_default();
        Err(StoreError::new(
            StoreErrorKind::Rejected,
            rejection_message(status.as_u16(), &body),
        ))
    }

    fn rows_from(resp: Response) -> Result<Vec<Row>, StoreError> {
        let body: JsonValue = resp
            .json()
            .map_err(|e| StoreError::new(StoreErrorKind::Decode, e.to_string()))?;
        rows_from_json(body)
    }
}

/// The store reports failures as `{"message": ...}`; fall back to the raw
/// body, then to the status line.
fn rejection_message(status: u16, body: &str) -> String {
    let from_json = serde_json::from_str::<JsonValue>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string));
    match from_json {
        Some(m) => m,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => format!("store returned HTTP {}", status),
    }
}

fn rows_from_json(body: JsonValue) -> Result<Vec<Row>, StoreError> {
    let JsonValue::Array(items) = body else {
        return Err(StoreError::new(
            StoreErrorKind::Decode,
            "expected a JSON array of rows",
        ));
    };
    // Non-object entries are dropped rather than failing the whole read.
    Ok(items
        .into_iter()
        .filter_map(|v| match v {
            JsonValue::Object(m) => Some(m),
            _ => None,
        })
        .collect())
}

fn not_found(collection: Collection, id: &str) -> StoreError {
    StoreError::new(
        StoreErrorKind::NotFound,
        format!("{} row not found: {}", collection.table(), id),
    )
}

impl RecordStore for HttpStore {
    fn backend(&self) -> &'static str {
        "http"
    }

    fn list(&self, collection: Collection) -> Result<Vec<Row>, StoreError> {
        tracing::debug!(table = collection.table(), "store list");
        let url = self.list_url(collection)?;
        let resp = self.send(self.client.get(url))?;
        Self::rows_from(resp)
    }

    fn insert(&self, collection: Collection, row: Row) -> Result<Row, StoreError> {
        tracing::debug!(table = collection.table(), "store insert");
        check_columns(collection, &row)?;
        let url = self.table_url(collection)?;
        let body = JsonValue::Array(vec![JsonValue::Object(row)]);
        let resp = self.send(
            self.client
                .post(url)
                .header("Prefer", "return=representation")
                .json(&body),
        )?;
        Self::rows_from(resp)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::new(StoreErrorKind::Decode, "insert returned no row"))
    }

    fn update(&self, collection: Collection, id: &str, patch: Row) -> Result<(), StoreError> {
        tracing::debug!(table = collection.table(), %id, "store update");
        check_columns(collection, &patch)?;
        let url = self.id_url(collection, id)?;
        let resp = self.send(
            self.client
                .patch(url)
                .header("Prefer", "return=representation")
                .json(&JsonValue::Object(patch)),
        )?;
        if Self::rows_from(resp)?.is_empty() {
            return Err(not_found(collection, id));
        }
        Ok(())
    }

    fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        tracing::debug!(table = collection.table(), %id, "store delete");
        let url = self.id_url(collection, id)?;
        let resp = self.send(
            self.client
                .delete(url)
                .header("Prefer", "return=representation"),
        )?;
        if Self::rows_from(resp)?.is_empty() {
            return Err(not_found(collection, id));
        }
        Ok(())
    }
}
