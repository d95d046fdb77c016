//! Startup configuration.
//!
//! Merge order (later overrides earlier): compiled defaults, `./clientpay.toml`,
//! then `CLIENTPAY_*` environment variables. The store endpoint and access
//! key have no defaults; without them the process refuses to start.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

pub const ENV_PREFIX: &str = "CLIENTPAY_";
pub const CONFIG_FILE: &str = "clientpay.toml";

#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    store_url: Option<String>,
    #[serde(default)]
    store_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    request_timeout_secs: u64,
    #[serde(default = "default_log_level")]
    log_level: String,
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Clone)]
pub struct Config {
    pub store_url: String,
    pub store_key: String,
    pub request_timeout_secs: u64,
    pub log_level: String,
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

// The access key must never reach logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("store_url", &self.store_url)
            .field("store_key", &"<redacted>")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("log_level", &self.log_level)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] figment::Error),
}

pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Toml::file(CONFIG_FILE))
        .merge(Env::prefixed(ENV_PREFIX))
}

pub fn load_config() -> Result<Config, ConfigError> {
    from_figment(build_figment())
}

pub fn from_figment(figment: Figment) -> Result<Config, ConfigError> {
    let raw: RawConfig = figment.extract()?;
    let present = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let store_url = present(raw.store_url);
    let store_key = present(raw.store_key);

    let mut missing = Vec::new();
    if store_url.is_none() {
        missing.push("CLIENTPAY_STORE_URL");
    }
    if store_key.is_none() {
        missing.push("CLIENTPAY_STORE_KEY");
    }
    match (store_url, store_key) {
        (Some(store_url), Some(store_key)) => Ok(Config {
            store_url,
            store_key,
            request_timeout_secs: raw.request_timeout_secs,
            log_level: raw.log_level,
        }),
        _ => Err(ConfigError::Missing(missing)),
    }
}
