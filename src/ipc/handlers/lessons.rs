use crate::actions;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{opt_date, parse_bool, required_str, today};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn lessons_mark_taught(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let session_id = required_str(params, "sessionId")?;
    let date = match opt_date(params, "date")? {
        Some(d) => d,
        None => today(params)?,
    };
    let marked = actions::mark_taught(state, &session_id, date)?;
    Ok(json!(marked))
}

fn lessons_mark_paid(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let record_id = required_str(params, "recordId")?;
    let marked = actions::mark_paid(state, &record_id)?;
    Ok(json!(marked))
}

fn history_delete(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let record_id = required_str(params, "recordId")?;
    let confirmed = parse_bool(params, "confirmed", false)?;
    actions::delete_occurrence(state, &record_id, confirmed)?;
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "lessons.markTaught" => lessons_mark_taught(state, &req.params),
        "lessons.markPaid" => lessons_mark_paid(state, &req.params),
        "history.delete" => history_delete(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
