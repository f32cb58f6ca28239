// Standard library
use std::path::PathBuf;
use std::sync::Arc;

// 3rd party crates
use serde::Deserialize;
use tokio::sync::RwLock;

// Project imports
use crate::api::constants::{default_api_url, default_request_timeout};
use crate::utility::rate_limiter::RateLimitConfig;

use super::constants::DEFAULT_LOG_LEVEL;

#[derive(Debug, Deserialize, Clone)]
pub struct Log {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Api {
    #[serde(default = "default_api_url")]
    pub url: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub log: Log,
    pub api: Api,
    pub rate_limit: RateLimitConfig,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Settings that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedSettings(pub(super) Settings);

/// Holds the settings loaded and validated at startup.
pub struct ConfigManager {
    pub settings: Arc<RwLock<Settings>>,
    pub config_path: PathBuf,
}
