use std::time::Duration;

use crate::{ConfigError, Vars};

/// Listener addresses and serving timeouts.
#[derive(Clone, Debug)]
pub struct WebConfig {
    pub api_host: String,
    pub debug_host: String,
    /// Upper bound for reading a request body.
    pub read_timeout: Duration,
    /// Upper bound for producing a response once the request is read.
    pub write_timeout: Duration,
    /// Keep-alive connections with no request in flight are closed after this.
    pub idle_timeout: Duration,
    /// Grace period given to in-flight requests once draining starts.
    pub shutdown_timeout: Duration,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0:3000".to_string(),
            debug_host: "0.0.0.0:4000".to_string(),
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(120),
            shutdown_timeout: Duration::from_secs(20),
        }
    }
}

impl WebConfig {
    pub(crate) fn load(vars: &Vars<'_>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            api_host: vars.string("WEB_API_HOST", &defaults.api_host),
            debug_host: vars.string("WEB_DEBUG_HOST", &defaults.debug_host),
            read_timeout: vars.duration("WEB_READ_TIMEOUT", defaults.read_timeout)?,
            write_timeout: vars.duration("WEB_WRITE_TIMEOUT", defaults.write_timeout)?,
            idle_timeout: vars.duration("WEB_IDLE_TIMEOUT", defaults.idle_timeout)?,
            shutdown_timeout: vars.duration("WEB_SHUTDOWN_TIMEOUT", defaults.shutdown_timeout)?,
        })
    }
}
