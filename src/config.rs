// src/config.rs

use std::env;
use std::time::Duration;
use dotenvy::dotenv;

const DEFAULT_API_URL: &str = "http://localhost:8080/";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the exam API. Always ends with '/' so relative routes join under it.
    pub api_base_url: String,
    pub rust_log: String,
    pub log_dir: String,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            rust_log: "info".to_string(),
            log_dir: "logs".to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let defaults = Self::default();

        let mut api_base_url = env::var("EXAM_API_URL")
            .unwrap_or(defaults.api_base_url);
        if !api_base_url.ends_with('/') {
            api_base_url.push('/');
        }

        let rust_log = env::var("RUST_LOG")
            .unwrap_or(defaults.rust_log);

        let log_dir = env::var("EXAM_LOG_DIR")
            .unwrap_or(defaults.log_dir);

        let request_timeout_secs = env::var("EXAM_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.request_timeout_secs);

        Self {
            api_base_url,
            rust_log,
            log_dir,
            request_timeout_secs,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
