mod test_support;

use serde_json::json;
use std::io::{BufRead, Write};
use test_support::{error_code, request, request_ok, spawn_sidecar, temp_dir};

#[test]
fn health_reports_backend_and_empty_counts() {
    let workspace = temp_dir("clientpay-health");
    let (_child, mut stdin, mut reader) = spawn_sidecar(&workspace);

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["store"], json!("sqlite"));
    assert_eq!(health["records"]["sessions"], json!(0));
    assert_eq!(health["records"]["history"], json!(0));
    assert!(health["version"].as_str().is_some());

    let state = request_ok(&mut stdin, &mut reader, "2", "state.get", json!({}));
    assert_eq!(state["ui"]["view"], json!("schedule"));
    assert_eq!(state["ui"]["weekOffset"], json!(0));
    assert_eq!(state["lastError"], json!(null));
}

#[test]
fn unknown_method_and_bad_json_get_error_envelopes() {
    let workspace = temp_dir("clientpay-unknown");
    let (_child, mut stdin, mut reader) = spawn_sidecar(&workspace);

    let resp = request(&mut stdin, &mut reader, "1", "students.list", json!({}));
    assert_eq!(error_code(&resp), "not_implemented");

    writeln!(stdin, "{{not json").expect("write");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read");
    let resp: serde_json::Value = serde_json::from_str(line.trim()).expect("json");
    assert_eq!(resp["ok"], json!(false));
    assert_eq!(resp["error"]["code"], json!("bad_json"));

    // The loop keeps serving after a bad line.
    let _ = request_ok(&mut stdin, &mut reader, "2", "health", json!({}));
}

#[test]
fn view_set_accepts_known_views_only() {
    let workspace = temp_dir("clientpay-view");
    let (_child, mut stdin, mut reader) = spawn_sidecar(&workspace);

    let res = request_ok(&mut stdin, &mut reader, "1", "view.set", json!({ "view": "history" }));
    assert_eq!(res["ui"]["view"], json!("history"));
    let res = request_ok(&mut stdin, &mut reader, "2", "view.set", json!({ "view": "timetable" }));
    assert_eq!(res["ui"]["view"], json!("schedule"));

    let resp = request(&mut stdin, &mut reader, "3", "view.set", json!({ "view": "settings" }));
    assert_eq!(error_code(&resp), "bad_params");
    let resp = request(&mut stdin, &mut reader, "4", "view.set", json!({}));
    assert_eq!(error_code(&resp), "bad_params");
}
