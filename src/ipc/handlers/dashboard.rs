//! Read-only views over the current snapshot.

use crate::calendar::format_iso_date;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::today;
use crate::ipc::types::{AppState, Request};
use crate::views::partition;
use serde_json::json;

fn today_view(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let today = today(params)?;
    let p = partition(&state.records.sessions, &state.records.history, today);
    Ok(json!({
        "date": format_iso_date(today),
        "upcoming": p.upcoming,
        "awaitingPayment": p.awaiting_payment,
        "totalPending": p.total_pending,
    }))
}

fn history_view(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let today = today(params)?;
    let p = partition(&state.records.sessions, &state.records.history, today);
    Ok(json!({
        "paidHistory": p.paid_history,
        "totalEarned": p.total_earned,
    }))
}

fn stats_get(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let today = today(params)?;
    let p = partition(&state.records.sessions, &state.records.history, today);
    Ok(json!({
        "totalClients": p.total_clients,
        "totalPending": p.total_pending,
        "totalEarned": p.total_earned,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "today.view" => today_view(state, &req.params),
        "history.view" => history_view(state, &req.params),
        "stats.get" => stats_get(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
