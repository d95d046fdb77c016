use crate::actions;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{input, opt_str, parse_bool, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::{SessionDraft, SessionPatch, TimeOfDay, Weekday};
use serde_json::json;

fn form_options() -> serde_json::Value {
    let days: Vec<&str> = Weekday::ALL.iter().map(|d| d.name()).collect();
    let times: Vec<String> = TimeOfDay::options().iter().map(|t| t.to_string()).collect();
    json!({ "days": days, "times": times })
}

fn sessions_list(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({ "sessions": state.records.sessions }))
}

fn sessions_create(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let draft: SessionDraft = input(params)?;
    let session_id = actions::create_session(state, &draft)?;
    Ok(json!({ "sessionId": session_id }))
}

fn sessions_update(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let session_id = required_str(params, "sessionId")?;
    let patch: SessionPatch = input(params)?;
    if patch.is_empty() {
        return Err(HandlerErr::bad_params("input has no fields to update"));
    }
    actions::update_session(state, &session_id, &patch)?;
    Ok(json!({ "ok": true }))
}

fn sessions_delete(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let session_id = required_str(params, "sessionId")?;
    let confirmed = parse_bool(params, "confirmed", false)?;
    actions::delete_session(state, &session_id, confirmed)?;
    Ok(json!({ "ok": true }))
}

fn form_open(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let session_id = opt_str(params, "sessionId")?;
    let form = actions::open_form(state, session_id.as_deref())?;
    Ok(json!({ "form": form, "options": form_options() }))
}

fn form_cancel(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    actions::cancel_form(state);
    Ok(json!({ "ui": state.ui }))
}

fn form_submit(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    if state.ui.form.is_none() {
        return Err(HandlerErr::bad_params("no form is open"));
    }
    let draft: SessionDraft = input(params)?;
    let session_id = actions::submit_form(state, draft)?;
    Ok(json!({ "sessionId": session_id, "ui": state.ui }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "sessions.list" => sessions_list(state),
        "sessions.create" => sessions_create(state, &req.params),
        "sessions.update" => sessions_update(state, &req.params),
        "sessions.delete" => sessions_delete(state, &req.params),
        "form.open" => form_open(state, &req.params),
        "form.cancel" => form_cancel(state),
        "form.submit" => form_submit(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
