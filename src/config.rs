// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the client. Configuration is loaded from the environment once
//! at startup and then passed explicitly to every component.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `PAHINGA_API_URL` | Base URL of the journal API | `http://localhost:8000/api/` |
//! | `PAHINGA_DATA_DIR` | Directory holding the durable token store | `.pahinga` |
//! | `PAHINGA_AUTOSAVE_DEBOUNCE_MS` | Autosave debounce interval | `500` |
//! | `PAHINGA_HTTP_TIMEOUT_SECS` | HTTP transport timeout | `15` |
//! | `PAHINGA_CACHE_TTL_SECS` | Profile/journal cache freshness | `300` |
//! | `PAHINGA_CACHE_CAPACITY` | Max cached journal entries | `64` |
//! | `PAHINGA_SESSION_POLL_MS` | Interval for picking up logins/logouts from other processes (`0` disables) | `2000` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

/// Environment variable name for the API base URL.
pub const API_URL_ENV: &str = "PAHINGA_API_URL";

/// Environment variable name for the data directory.
///
/// The durable token store (`session.redb`) lives here.
pub const DATA_DIR_ENV: &str = "PAHINGA_DATA_DIR";

/// Environment variable name for the autosave debounce interval (ms).
pub const DEBOUNCE_MS_ENV: &str = "PAHINGA_AUTOSAVE_DEBOUNCE_MS";

/// Environment variable name for the HTTP timeout (seconds).
pub const HTTP_TIMEOUT_ENV: &str = "PAHINGA_HTTP_TIMEOUT_SECS";

/// Environment variable name for the cache TTL (seconds).
pub const CACHE_TTL_ENV: &str = "PAHINGA_CACHE_TTL_SECS";

/// Environment variable name for the cached entry capacity.
pub const CACHE_CAPACITY_ENV: &str = "PAHINGA_CACHE_CAPACITY";

/// Environment variable name for the token store reload interval (ms).
pub const SESSION_POLL_MS_ENV: &str = "PAHINGA_SESSION_POLL_MS";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/";
pub const DEFAULT_DATA_DIR: &str = ".pahinga";
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_CACHE_CAPACITY: usize = 64;
pub const DEFAULT_SESSION_POLL: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not a valid URL: {reason}")]
    InvalidUrl { name: &'static str, reason: String },

    #[error("{name} has an invalid value: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "" => Ok(LogFormat::Pretty),
            other => Err(ConfigError::InvalidValue {
                name: LOG_FORMAT_ENV,
                value: other.to_string(),
            }),
        }
    }
}

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: Url,
    pub data_dir: PathBuf,
    pub autosave_debounce: Duration,
    pub http_timeout: Duration,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    /// Zero turns the reload off.
    pub session_poll: Duration,
    pub log_format: LogFormat,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            autosave_debounce: DEFAULT_DEBOUNCE,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            session_poll: DEFAULT_SESSION_POLL,
            log_format: LogFormat::Pretty,
        }
    }
}

impl ClientConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary lookup (tests inject a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_url = match get(API_URL_ENV) {
            Some(raw) => normalize_base_url(&raw)?,
            None => normalize_base_url(DEFAULT_API_URL)?,
        };

        let data_dir = get(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let autosave_debounce = parse_number::<u64>(DEBOUNCE_MS_ENV, get(DEBOUNCE_MS_ENV))?
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_DEBOUNCE);

        let http_timeout = parse_number::<u64>(HTTP_TIMEOUT_ENV, get(HTTP_TIMEOUT_ENV))?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT);

        let cache_ttl = parse_number::<u64>(CACHE_TTL_ENV, get(CACHE_TTL_ENV))?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CACHE_TTL);

        let cache_capacity = parse_number::<usize>(CACHE_CAPACITY_ENV, get(CACHE_CAPACITY_ENV))?
            .unwrap_or(DEFAULT_CACHE_CAPACITY);

        let session_poll = parse_number::<u64>(SESSION_POLL_MS_ENV, get(SESSION_POLL_MS_ENV))?
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_SESSION_POLL);

        let log_format = match get(LOG_FORMAT_ENV) {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            api_url,
            data_dir,
            autosave_debounce,
            http_timeout,
            cache_ttl,
            cache_capacity,
            session_poll,
            log_format,
        })
    }
}

/// Parse a base URL, forcing a trailing slash so relative joins keep the
/// last path segment (`/api` + `journals/` -> `/api/journals/`).
fn normalize_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl {
        name: API_URL_ENV,
        reason: e.to_string(),
    })
}

fn parse_number<T: FromStr>(name: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError> {
    raw.map(|value| {
        value
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { name, value })
    })
    .transpose()
}
