//! # Sales Config
//!
//! Configuration for the Sales API, loaded from `SALES_*` environment
//! variables (and a `.env` file when present):
//!
//! - [`web`]: listener addresses and serving timeouts
//! - [`auth`]: signing key folder, active key id, issuer and token lifetime
//! - [`database`]: connection URL and pool size
//!
//! # Example
//!
//! ```ignore
//! use sales_config::Config;
//!
//! let config = Config::from_env()?;
//! println!("api listening on {}", config.web.api_host);
//! ```

pub mod auth;
pub mod database;
pub mod web;

use std::env;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

// Re-export commonly used types at crate root
pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use web::WebConfig;

/// Prefix shared by every environment variable this crate reads.
pub const PREFIX: &str = "SALES";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: invalid duration {value:?}")]
    InvalidDuration { key: String, value: String },
    #[error("{key}: invalid number {value:?}")]
    InvalidNumber { key: String, value: String },
    #[error("{key}: invalid value {value:?}, expected one of {expected}")]
    InvalidChoice {
        key: String,
        value: String,
        expected: &'static str,
    },
}

/// Output format of the process logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub web: WebConfig,
    pub auth: AuthConfig,
    pub db: DatabaseConfig,
    pub log_format: LogFormat,
}

impl Config {
    /// Loads `.env` (if any) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup: &lookup };
        let log_format = match vars.get("LOG_FORMAT").as_deref() {
            None | Some("compact") => LogFormat::Compact,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidChoice {
                    key: Vars::key("LOG_FORMAT"),
                    value: other.to_string(),
                    expected: "compact, json",
                });
            }
        };

        Ok(Self {
            web: WebConfig::load(&vars)?,
            auth: AuthConfig::load(&vars)?,
            db: DatabaseConfig::load(&vars)?,
            log_format,
        })
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "web.api_host={}", self.web.api_host)?;
        writeln!(f, "web.debug_host={}", self.web.debug_host)?;
        writeln!(f, "web.read_timeout={:?}", self.web.read_timeout)?;
        writeln!(f, "web.write_timeout={:?}", self.web.write_timeout)?;
        writeln!(f, "web.idle_timeout={:?}", self.web.idle_timeout)?;
        writeln!(f, "web.shutdown_timeout={:?}", self.web.shutdown_timeout)?;
        writeln!(f, "auth.keys_folder={}", self.auth.keys_folder)?;
        writeln!(f, "auth.active_kid={}", self.auth.active_kid)?;
        writeln!(f, "auth.issuer={}", self.auth.issuer)?;
        writeln!(f, "auth.token_ttl={:?}", self.auth.token_ttl)?;
        writeln!(f, "db.url={}", self.db.masked_url())?;
        write!(f, "db.max_open_conns={}", self.db.max_open_conns)
    }
}

/// Prefixed view over a key lookup.
pub(crate) struct Vars<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl Vars<'_> {
    pub(crate) fn key(name: &str) -> String {
        format!("{PREFIX}_{name}")
    }

    pub(crate) fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(&Self::key(name)).filter(|v| !v.trim().is_empty())
    }

    pub(crate) fn string(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    pub(crate) fn duration(&self, name: &str, default: Duration) -> Result<Duration, ConfigError> {
        match self.get(name) {
            None => Ok(default),
            Some(value) => parse_duration(&value).ok_or(ConfigError::InvalidDuration {
                key: Self::key(name),
                value,
            }),
        }
    }

    pub(crate) fn number(&self, name: &str, default: u32) -> Result<u32, ConfigError> {
        match self.get(name) {
            None => Ok(default),
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                key: Self::key(name),
                value,
            }),
        }
    }
}

/// Parses `500ms`, `5s`, `2m`, `1h` or a bare number of seconds.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);
    let amount: u64 = digits.parse().ok()?;

    match unit {
        "" | "s" => Some(Duration::from_secs(amount)),
        "ms" => Some(Duration::from_millis(amount)),
        "m" => Some(Duration::from_secs(amount.checked_mul(60)?)),
        "h" => Some(Duration::from_secs(amount.checked_mul(3600)?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.web.api_host, "0.0.0.0:3000");
        assert_eq!(config.web.debug_host, "0.0.0.0:4000");
        assert_eq!(config.web.read_timeout, Duration::from_secs(5));
        assert_eq!(config.web.write_timeout, Duration::from_secs(10));
        assert_eq!(config.web.idle_timeout, Duration::from_secs(120));
        assert_eq!(config.web.shutdown_timeout, Duration::from_secs(20));
        assert_eq!(config.auth.issuer, "service project");
        assert_eq!(config.auth.token_ttl, Duration::from_secs(3600));
        assert_eq!(config.log_format, LogFormat::Compact);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("SALES_WEB_API_HOST", "127.0.0.1:8080"),
            ("SALES_WEB_SHUTDOWN_TIMEOUT", "2m"),
            ("SALES_WEB_READ_TIMEOUT", "750ms"),
            ("SALES_DB_MAX_OPEN_CONNS", "12"),
            ("SALES_LOG_FORMAT", "json"),
        ]))
        .unwrap();
        assert_eq!(config.web.api_host, "127.0.0.1:8080");
        assert_eq!(config.web.shutdown_timeout, Duration::from_secs(120));
        assert_eq!(config.web.read_timeout, Duration::from_millis(750));
        assert_eq!(config.db.max_open_conns, 12);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_duration_is_reported() {
        let err = Config::from_lookup(lookup(&[("SALES_WEB_IDLE_TIMEOUT", "soon")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidDuration {
                key: "SALES_WEB_IDLE_TIMEOUT".into(),
                value: "soon".into()
            }
        );
    }

    #[test]
    fn test_invalid_log_format() {
        let err = Config::from_lookup(lookup(&[("SALES_LOG_FORMAT", "xml")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidChoice { .. }));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("5"), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration("5s"), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_duration("1h"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_duration("s"), None);
        assert_eq!(parse_duration("5d"), None);
    }

    #[test]
    fn test_display_masks_password() {
        let config = Config::from_lookup(lookup(&[(
            "SALES_DB_URL",
            "postgres://postgres:hunter2@db:5432/sales",
        )]))
        .unwrap();
        let shown = config.to_string();
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("db:5432/sales"));
    }
}
