use super::error::HandlerErr;
use crate::calendar::{local_today, parse_iso_date, MAX_WEEK_OFFSET};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

pub fn required_str(params: &JsonValue, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn opt_str(params: &JsonValue, key: &str) -> Result<Option<String>, HandlerErr> {
    match params.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(v) => {
            let s = v
                .as_str()
                .ok_or_else(|| HandlerErr::bad_params(format!("{} must be string or null", key)))?
                .trim()
                .to_string();
            Ok(if s.is_empty() { None } else { Some(s) })
        }
    }
}

pub fn parse_bool(params: &JsonValue, key: &str, default: bool) -> Result<bool, HandlerErr> {
    match params.get(key) {
        None | Some(JsonValue::Null) => Ok(default),
        Some(v) => v
            .as_bool()
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be boolean", key))),
    }
}

/// Week offsets and deltas, bounded to keep date arithmetic in range.
pub fn opt_week_offset(params: &JsonValue, key: &str) -> Result<Option<i64>, HandlerErr> {
    match params.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(v) => {
            let n = v
                .as_i64()
                .ok_or_else(|| HandlerErr::bad_params(format!("{} must be integer", key)))?;
            if n.abs() > MAX_WEEK_OFFSET {
                return Err(HandlerErr::bad_params(format!(
                    "{} must be within +/-{}",
                    key, MAX_WEEK_OFFSET
                )));
            }
            Ok(Some(n))
        }
    }
}

pub fn opt_date(params: &JsonValue, key: &str) -> Result<Option<NaiveDate>, HandlerErr> {
    match opt_str(params, key)? {
        None => Ok(None),
        Some(raw) => parse_iso_date(&raw)
            .map(Some)
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be YYYY-MM-DD", key))),
    }
}

/// `params.today` when the caller supplies its own date, else the local date.
pub fn today(params: &JsonValue) -> Result<NaiveDate, HandlerErr> {
    Ok(opt_date(params, "today")?.unwrap_or_else(local_today))
}

/// `params.input` decoded as a form draft or an edit patch.
pub fn input<T: DeserializeOwned>(params: &JsonValue) -> Result<T, HandlerErr> {
    let Some(input) = params.get("input").filter(|v| v.is_object()) else {
        return Err(HandlerErr::bad_params("missing input"));
    };
    serde_json::from_value(input.clone())
        .map_err(|e| HandlerErr::bad_params(format!("input: {}", e)))
}
