use crate::grid::{bucket_cell, project_cell, week_grid};
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{opt_str, opt_week_offset, required_str, today};
use crate::ipc::types::{AppState, Request};
use crate::model::Weekday;
use serde_json::json;

fn grid_for_current_week(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let today = today(params)?;
    let grid = week_grid(
        &state.records.sessions,
        &state.records.history,
        today,
        state.ui.week_offset,
    );
    Ok(json!({ "grid": grid, "ui": state.ui }))
}

fn schedule_week(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    if let Some(offset) = opt_week_offset(params, "offset")? {
        state.ui = state.ui.clone().with_week(offset);
    }
    grid_for_current_week(state, params)
}

fn schedule_shift_week(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let Some(delta) = opt_week_offset(params, "delta")? else {
        return Err(HandlerErr::bad_params("missing delta"));
    };
    state.ui = state.ui.clone().shift_week(delta);
    grid_for_current_week(state, params)
}

/// One (day, hour) cell. `mode: "span"` lists every session covering the
/// hour; the default lists sessions starting in it, positioned.
fn schedule_cell(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let day = required_str(params, "day")?
        .parse::<Weekday>()
        .map_err(HandlerErr::bad_params)?;
    let hour = params
        .get("hour")
        .and_then(|v| v.as_u64())
        .filter(|h| *h < 24)
        .ok_or_else(|| HandlerErr::bad_params("hour must be 0-23"))? as u16;
    let sessions = &state.records.sessions;
    match opt_str(params, "mode")?.as_deref() {
        None | Some("start") => Ok(json!({ "blocks": project_cell(sessions, day, hour) })),
        Some("span") => Ok(json!({ "sessions": bucket_cell(sessions, day, hour) })),
        Some(other) => Err(HandlerErr::bad_params(format!("unknown mode: {}", other))),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "schedule.week" => schedule_week(state, &req.params),
        "schedule.shiftWeek" => schedule_shift_week(state, &req.params),
        "schedule.cell" => schedule_cell(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
