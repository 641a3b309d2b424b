// src/config.rs

use std::env;
use std::time::Duration;

use dotenvy::dotenv;
use url::Url;

use crate::error::ConfigError;

/// Seconds in one minute of quiz time limit.
pub const SECONDS_PER_MINUTE: u64 = 60;

/// Interval between two countdown ticks.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the quiz service, including the `/api/` prefix.
    /// Always ends with a slash.
    pub api_base_url: Url,
    /// Pre-issued bearer token forwarded with every request.
    pub api_token: Option<String>,
    pub request_timeout: Duration,
    pub rust_log: String,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("QUIZ_API_URL")
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::Missing("QUIZ_API_URL"))?;
        let api_base_url = parse_base_url(raw_url.trim())?;

        let api_token = lookup("QUIZ_API_TOKEN").filter(|token| !token.trim().is_empty());

        let request_timeout = match lookup("QUIZ_REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                    key: "QUIZ_REQUEST_TIMEOUT_SECS",
                    reason: e.to_string(),
                })?;
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        key: "QUIZ_REQUEST_TIMEOUT_SECS",
                        reason: "must be at least 1".to_string(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        let rust_log = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());
        let log_dir = lookup("QUIZ_LOG_DIR").unwrap_or_else(|| "logs".to_string());

        Ok(Self {
            api_base_url,
            api_token,
            request_timeout,
            rust_log,
            log_dir,
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    // Url::join drops the last path segment unless the base ends with '/'.
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };

    let url = Url::parse(&normalized).map_err(|e| ConfigError::Invalid {
        key: "QUIZ_API_URL",
        reason: e.to_string(),
    })?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::Invalid {
            key: "QUIZ_API_URL",
            reason: "must be a hierarchical http(s) URL".to_string(),
        });
    }

    Ok(url)
}
