//! User intents that touch the store.
//!
//! Each action makes at most one write and then reloads everything; there
//! is no local patching of the snapshot. A failed write leaves the previous
//! snapshot in place.

use crate::app::{AppState, FormState};
use crate::calendar::format_iso_date;
use crate::model::{DraftError, LessonStatus, Occurrence, SessionDraft, SessionPatch};
use crate::store::{Collection, RecordStore, Row, StoreError};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value as JsonValue};

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error(transparent)]
    Validation(#[from] DraftError),
    #[error("{0} requires confirmed: true")]
    ConfirmationRequired(&'static str),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ActionError {
    pub fn code(&self) -> &'static str {
        match self {
            ActionError::Validation(_) => "validation_failed",
            ActionError::ConfirmationRequired(_) => "confirmation_required",
            ActionError::NotFound(_) => "not_found",
            ActionError::Store(e) => e.kind.as_code(),
        }
    }

    pub fn details(&self) -> Option<JsonValue> {
        match self {
            ActionError::Validation(e) => Some(json!({ "missing": e.missing })),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkTaught {
    pub record_id: String,
    pub date: String,
    pub already_recorded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkPaid {
    pub record_id: String,
    pub changed: bool,
}

fn write_then_reload<T>(
    state: &mut AppState,
    what: &'static str,
    write: impl FnOnce(&dyn RecordStore) -> Result<T, StoreError>,
) -> Result<T, ActionError> {
    let out = match write(state.store.as_ref()) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(action = what, error = %e, "store write failed");
            state.last_error = Some(e.to_string());
            return Err(e.into());
        }
    };
    state.reload()?;
    Ok(out)
}

fn inserted_id(row: &Row) -> Result<String, StoreError> {
    match row.get("id") {
        Some(JsonValue::String(s)) => Ok(s.clone()),
        Some(JsonValue::Number(n)) => Ok(n.to_string()),
        _ => Err(StoreError::new(
            crate::store::StoreErrorKind::Decode,
            "stored row has no id",
        )),
    }
}

pub fn create_session(state: &mut AppState, draft: &SessionDraft) -> Result<String, ActionError> {
    draft.validate()?;
    let id = write_then_reload(state, "sessions.create", |store| {
        let saved = store.insert(Collection::Schedule, draft.to_row())?;
        inserted_id(&saved)
    })?;
    tracing::info!(session = %id, day = %draft.day, "session created");
    Ok(id)
}

/// Writes only the columns `patch` carries.
pub fn update_session(
    state: &mut AppState,
    id: &str,
    patch: &SessionPatch,
) -> Result<(), ActionError> {
    patch.validate()?;
    let row = patch.to_row();
    let columns = row.len();
    write_then_reload(state, "sessions.update", |store| {
        store.update(Collection::Schedule, id, row)
    })?;
    tracing::info!(session = %id, columns, "session updated");
    Ok(())
}

/// Occurrence history of a deleted session is kept; it still counts
/// toward pending and earned totals.
pub fn delete_session(state: &mut AppState, id: &str, confirmed: bool) -> Result<(), ActionError> {
    if !confirmed {
        return Err(ActionError::ConfirmationRequired("sessions.delete"));
    }
    write_then_reload(state, "sessions.delete", |store| {
        store.delete(Collection::Schedule, id)
    })?;
    tracing::info!(session = %id, "session deleted");
    Ok(())
}

/// Records the session as taught on `date`. A second call for the same
/// (session, date) returns the existing record without writing.
pub fn mark_taught(
    state: &mut AppState,
    session_id: &str,
    date: NaiveDate,
) -> Result<MarkTaught, ActionError> {
    let Some(session) = state.records.session(session_id).cloned() else {
        return Err(ActionError::NotFound(format!("session not found: {}", session_id)));
    };
    if let Some(existing) = state
        .records
        .history
        .iter()
        .find(|h| h.session_id == session_id && h.is_on(date))
    {
        tracing::info!(session = %session_id, record = %existing.id, "already recorded for date");
        return Ok(MarkTaught {
            record_id: existing.id.clone(),
            date: format_iso_date(date),
            already_recorded: true,
        });
    }
    let record_id = write_then_reload(state, "lessons.markTaught", |store| {
        let saved = store.insert(
            Collection::LessonHistory,
            Occurrence::taught_row(&session, date),
        )?;
        inserted_id(&saved)
    })?;
    tracing::info!(session = %session_id, record = %record_id, "marked taught");
    Ok(MarkTaught {
        record_id,
        date: format_iso_date(date),
        already_recorded: false,
    })
}

/// Flips a taught occurrence to paid. Already-paid records are left alone.
pub fn mark_paid(state: &mut AppState, record_id: &str) -> Result<MarkPaid, ActionError> {
    let Some(current) = state.records.occurrence(record_id).map(|h| h.status) else {
        return Err(ActionError::NotFound(format!("record not found: {}", record_id)));
    };
    if current == LessonStatus::Paid {
        return Ok(MarkPaid {
            record_id: record_id.to_string(),
            changed: false,
        });
    }
    let next = current.advance();
    let mut patch = Row::new();
    patch.insert("status".into(), json!(next.as_str()));
    write_then_reload(state, "lessons.markPaid", |store| {
        store.update(Collection::LessonHistory, record_id, patch)
    })?;
    tracing::info!(record = %record_id, status = next.as_str(), "marked paid");
    Ok(MarkPaid {
        record_id: record_id.to_string(),
        changed: true,
    })
}

pub fn delete_occurrence(
    state: &mut AppState,
    record_id: &str,
    confirmed: bool,
) -> Result<(), ActionError> {
    if !confirmed {
        return Err(ActionError::ConfirmationRequired("history.delete"));
    }
    write_then_reload(state, "history.delete", |store| {
        store.delete(Collection::LessonHistory, record_id)
    })?;
    tracing::info!(record = %record_id, "history record deleted");
    Ok(())
}

/// Blank form for a new session, or one prefilled from `session_id`.
pub fn open_form(state: &mut AppState, session_id: Option<&str>) -> Result<FormState, ActionError> {
    let form = match session_id {
        None => FormState {
            editing: None,
            draft: SessionDraft::default(),
        },
        Some(id) => {
            let session = state
                .records
                .session(id)
                .ok_or_else(|| ActionError::NotFound(format!("session not found: {}", id)))?;
            FormState {
                editing: Some(id.to_string()),
                draft: SessionDraft::from_session(session),
            }
        }
    };
    state.ui = state.ui.clone().open_form(form.clone());
    Ok(form)
}

pub fn cancel_form(state: &mut AppState) {
    state.ui = state.ui.clone().close_form();
}

/// Saves the open form (creating or updating) and closes it on success.
/// Returns the id of the saved session.
pub fn submit_form(state: &mut AppState, draft: SessionDraft) -> Result<String, ActionError> {
    let editing = state.ui.form.as_ref().and_then(|f| f.editing.clone());
    let id = match editing {
        Some(id) => {
            update_session(state, &id, &SessionPatch::from(&draft))?;
            id
        }
        None => create_session(state, &draft)?,
    };
    state.ui = state.ui.clone().close_form();
    Ok(id)
}
