use crate::app::View;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn counts(state: &AppState) -> serde_json::Value {
    json!({
        "sessions": state.records.sessions.len(),
        "history": state.records.history.len(),
        "skipped": state.records.skipped,
        "loadedAt": state.records.loaded_at,
    })
}

fn health(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "store": state.store.backend(),
        "records": counts(state),
    }))
}

fn state_get(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({
        "ui": state.ui,
        "records": counts(state),
        "lastError": state.last_error,
    }))
}

fn state_reload(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    state.reload()?;
    Ok(json!({ "records": counts(state) }))
}

fn view_set(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let raw = required_str(params, "view")?;
    let view = raw.parse::<View>().map_err(HandlerErr::bad_params)?;
    state.ui = state.ui.clone().with_view(view);
    Ok(json!({ "ui": state.ui }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "health" => health(state),
        "state.get" => state_get(state),
        "state.reload" => state_reload(state),
        "view.set" => view_set(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
