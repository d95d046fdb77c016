mod actions;
mod app;
mod calendar;
mod config;
mod grid;
mod ipc;
mod model;
mod store;
mod views;

use anyhow::Context;
use std::io::{self, BufRead, Write};

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("clientpayd={log_level},warn")));

    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
}

fn run() -> anyhow::Result<()> {
    let config = config::load_config().context("loading configuration")?;
    init_tracing(&config.log_level);
    tracing::info!(?config, "starting clientpayd");

    let store = store::open_store(&config.store_url, &config.store_key, config.request_timeout())
        .context("opening record store")?;
    let mut state = ipc::AppState::new(store);
    // A failed first load is reported through state.get; the process keeps serving.
    if let Err(e) = state.reload() {
        tracing::warn!(error = %e, "initial load failed");
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "failed reading stdin");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&mut state, req),
            // Can't reply with an id we could not read.
            Err(e) => serde_json::json!({
                "ok": false,
                "error": { "code": "bad_json", "message": e.to_string() },
            }),
        };
        let encoded =
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string());
        writeln!(stdout, "{}", encoded).context("writing response")?;
        stdout.flush().context("flushing response")?;
    }
    tracing::info!("stdin closed, shutting down");
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("clientpayd: {e:#}");
        std::process::exit(2);
    }
}
