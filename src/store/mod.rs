//! Record store gateway.
//!
//! A stateless pass-through to the persistent store: every call is one
//! round-trip, nothing is cached here. Rows are plain JSON objects in the
//! store's own column layout; typing happens in `model`.

mod http;
mod local;

pub use http::HttpStore;
pub use local::LocalStore;

use std::time::Duration;

pub type Row = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Schedule,
    LessonHistory,
}

impl Collection {
    pub fn table(self) -> &'static str {
        match self {
            Collection::Schedule => "schedule",
            Collection::LessonHistory => "lesson_history",
        }
    }

    /// Columns a caller may write. `id` and the creation column are
    /// assigned by the store.
    pub fn writable_columns(self) -> &'static [&'static str] {
        match self {
            Collection::Schedule => &[
                "name",
                "phone",
                "email",
                "day",
                "start_time",
                "end_time",
                "grade",
                "payment_amount",
                "type",
            ],
            Collection::LessonHistory => &["client_id", "client_name", "amount", "date", "status"],
        }
    }

    pub fn created_column(self) -> &'static str {
        match self {
            Collection::Schedule => "added_date",
            Collection::LessonHistory => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    Network,
    Rejected,
    NotFound,
    Decode,
    Io,
    Invalid,
}

impl StoreErrorKind {
    pub fn as_code(self) -> &'static str {
        match self {
            StoreErrorKind::Network => "store_network",
            StoreErrorKind::Rejected => "store_rejected",
            StoreErrorKind::NotFound => "store_not_found",
            StoreErrorKind::Decode => "store_decode",
            StoreErrorKind::Io => "store_io",
            StoreErrorKind::Invalid => "store_invalid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}", code = .kind.as_code())]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::new(StoreErrorKind::Io, e.to_string())
    }
}

pub trait RecordStore {
    fn backend(&self) -> &'static str;
    fn list(&self, collection: Collection) -> Result<Vec<Row>, StoreError>;
    /// Returns the stored row, including the assigned `id`.
    fn insert(&self, collection: Collection, row: Row) -> Result<Row, StoreError>;
    fn update(&self, collection: Collection, id: &str, patch: Row) -> Result<(), StoreError>;
    fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError>;
}

/// Checks a row against the collection's writable columns.
pub(crate) fn check_columns(collection: Collection, row: &Row) -> Result<(), StoreError> {
    if row.is_empty() {
        return Err(StoreError::new(StoreErrorKind::Invalid, "row has no columns"));
    }
    let allowed = collection.writable_columns();
    let unknown: Vec<&str> = row
        .keys()
        .map(|k| k.as_str())
        .filter(|k| !allowed.contains(k))
        .collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(StoreError::new(
            StoreErrorKind::Invalid,
            format!("unknown columns for {}: {}", collection.table(), unknown.join(", ")),
        ))
    }
}

/// Picks a backend from the store URL: `sqlite::memory:`, `sqlite:<path>`,
/// or an `http(s)://` endpoint.
pub fn open_store(
    url: &str,
    key: &str,
    timeout: Duration,
) -> Result<Box<dyn RecordStore>, StoreError> {
    let url = url.trim();
    if url == "sqlite::memory:" {
        return Ok(Box::new(LocalStore::open_in_memory()?));
    }
    if let Some(path) = url.strip_prefix("sqlite:") {
        let path = path.trim_start_matches("//");
        if path.is_empty() {
            return Err(StoreError::new(StoreErrorKind::Invalid, "sqlite url has no path"));
        }
        return Ok(Box::new(LocalStore::open(std::path::Path::new(path))?));
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        return Ok(Box::new(HttpStore::new(url, key, timeout)?));
    }
    Err(StoreError::new(
        StoreErrorKind::Invalid,
        "store url must be http(s):// or sqlite:",
    ))
}
