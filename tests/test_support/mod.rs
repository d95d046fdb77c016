#![allow(dead_code)]

use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

/// Command for the sidecar with no inherited `CLIENTPAY_*` settings, run
/// from `workspace` so a stray `clientpay.toml` elsewhere is never read.
pub fn sidecar_command(workspace: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_clientpayd"));
    cmd.current_dir(workspace)
        .env_remove("CLIENTPAY_STORE_URL")
        .env_remove("CLIENTPAY_STORE_KEY")
        .env_remove("CLIENTPAY_REQUEST_TIMEOUT_SECS")
        .env_remove("CLIENTPAY_LOG_LEVEL")
        .env_remove("RUST_LOG");
    cmd
}

/// Sidecar backed by a fresh sqlite file inside `workspace`.
pub fn spawn_sidecar(workspace: &Path) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let db = workspace.join("clientpay.sqlite3");
    let mut child = sidecar_command(workspace)
        .env("CLIENTPAY_STORE_URL", format!("sqlite:{}", db.to_string_lossy()))
        .env("CLIENTPAY_STORE_KEY", "local-test-key")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn clientpayd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

pub fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

pub fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

/// Error code of a failed response; panics if the call succeeded.
pub fn error_code(value: &serde_json::Value) -> String {
    assert_eq!(value.get("ok").and_then(|v| v.as_bool()), Some(false), "{}", value);
    value["error"]["code"].as_str().unwrap_or("").to_string()
}
