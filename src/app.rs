use crate::calendar::MAX_WEEK_OFFSET;
use crate::model::{Occurrence, Session, SessionDraft};
use crate::store::{Collection, RecordStore, Row, StoreError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Schedule,
    Today,
    History,
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "schedule" | "timetable" => Ok(View::Schedule),
            "today" | "students" => Ok(View::Today),
            "history" => Ok(View::History),
            other => Err(format!("unknown view: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    /// Id of the session being edited; `None` for a new one.
    pub editing: Option<String>,
    pub draft: SessionDraft,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub view: View,
    pub week_offset: i64,
    pub form: Option<FormState>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            view: View::Schedule,
            week_offset: 0,
            form: None,
        }
    }
}

impl UiState {
    pub fn with_view(self, view: View) -> Self {
        Self { view, ..self }
    }

    pub fn with_week(self, offset: i64) -> Self {
        Self {
            week_offset: offset.clamp(-MAX_WEEK_OFFSET, MAX_WEEK_OFFSET),
            ..self
        }
    }

    pub fn shift_week(self, delta: i64) -> Self {
        let offset = self.week_offset.saturating_add(delta);
        self.with_week(offset)
    }

    pub fn open_form(self, form: FormState) -> Self {
        Self {
            form: Some(form),
            ..self
        }
    }

    pub fn close_form(self) -> Self {
        Self { form: None, ..self }
    }
}

/// Records as of the last successful reload. Replaced whole, never patched.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub sessions: Vec<Session>,
    pub history: Vec<Occurrence>,
    /// Rows that could not be decoded and were left out.
    pub skipped: usize,
    pub loaded_at: Option<String>,
}

fn decode_rows<T>(
    collection: Collection,
    rows: Vec<Row>,
    decode: fn(&Row) -> Result<T, String>,
    skipped: &mut usize,
) -> Vec<T> {
    rows.iter()
        .filter_map(|row| match decode(row) {
            Ok(v) => Some(v),
            Err(reason) => {
                *skipped += 1;
                tracing::warn!(
                    table = collection.table(),
                    id = row.get("id").and_then(|v| v.as_str()).unwrap_or(""),
                    %reason,
                    "skipping undecodable row"
                );
                None
            }
        })
        .collect()
}

impl Snapshot {
    /// One list call per collection. Either both succeed or the load fails.
    pub fn load(store: &dyn RecordStore) -> Result<Self, StoreError> {
        let session_rows = store.list(Collection::Schedule)?;
        let history_rows = store.list(Collection::LessonHistory)?;
        let mut skipped = 0;
        let sessions = decode_rows(
            Collection::Schedule,
            session_rows,
            Session::from_row,
            &mut skipped,
        );
        let history = decode_rows(
            Collection::LessonHistory,
            history_rows,
            Occurrence::from_row,
            &mut skipped,
        );
        Ok(Self {
            sessions,
            history,
            skipped,
            loaded_at: Some(chrono::Utc::now().to_rfc3339()),
        })
    }

    pub fn session(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn occurrence(&self, id: &str) -> Option<&Occurrence> {
        self.history.iter().find(|h| h.id == id)
    }
}

/// The single owner of everything the sidecar holds between requests.
pub struct AppState {
    pub store: Box<dyn RecordStore>,
    pub ui: UiState,
    pub records: Snapshot,
    pub last_error: Option<String>,
}

impl AppState {
    pub fn new(store: Box<dyn RecordStore>) -> Self {
        Self {
            store,
            ui: UiState::default(),
            records: Snapshot::default(),
            last_error: None,
        }
    }

    /// Full unconditional reload. On failure the previous snapshot stays.
    pub fn reload(&mut self) -> Result<(), StoreError> {
        match Snapshot::load(self.store.as_ref()) {
            Ok(snapshot) => {
                tracing::debug!(
                    sessions = snapshot.sessions.len(),
                    history = snapshot.history.len(),
                    skipped = snapshot.skipped,
                    "reloaded records"
                );
                self.records = snapshot;
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "reload failed");
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }
}
