use crate::errors::ConfigError;
use crate::retry::RetryPolicy;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use url::Url;

pub const INSERT_KEY_VAR: &str = "NR_INSERT_KEY";
pub const ENDPOINT_VAR: &str = "NR_ENDPOINT";
pub const MAX_RETRIES_VAR: &str = "NR_MAX_RETRIES";
pub const RETRY_INTERVAL_VAR: &str = "NR_RETRY_INTERVAL";

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 2000;

/// Everything the extension service needs to start.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Listener for API extension calls
    pub listener: Listener,
    /// Listener for `/health` and `/ready`
    pub admin_listener: Listener,
    pub telemetry: TelemetryConfig,
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Port 0 would bind an arbitrary port, which is never what a deployment wants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid {
                name: "port",
                reason: format!("listener {} cannot use port 0", self.host),
            });
        }
        Ok(())
    }
}

/// Telemetry ingestion settings, read once at startup and never mutated.
#[derive(Clone, PartialEq)]
pub struct TelemetryConfig {
    /// Secret sent in the `X-Insert-Key` header
    pub insert_key: String,
    /// Ingestion endpoint. Always an `https` URL with a host.
    pub endpoint: Url,
    pub retry: RetryPolicy,
}

impl TelemetryConfig {
    /// Loads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let insert_key = lookup(INSERT_KEY_VAR)
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::Missing(INSERT_KEY_VAR))?;

        let endpoint = lookup(ENDPOINT_VAR).ok_or(ConfigError::Missing(ENDPOINT_VAR))?;
        let endpoint = parse_endpoint(&endpoint)?;

        let max_attempts = match lookup(MAX_RETRIES_VAR) {
            Some(raw) => parse_number::<u32>(MAX_RETRIES_VAR, &raw)?,
            None => DEFAULT_MAX_ATTEMPTS,
        };
        if max_attempts == 0 {
            return Err(ConfigError::Invalid {
                name: MAX_RETRIES_VAR,
                reason: "must be at least 1".to_string(),
            });
        }

        let interval_ms = match lookup(RETRY_INTERVAL_VAR) {
            Some(raw) => parse_number::<u64>(RETRY_INTERVAL_VAR, &raw)?,
            None => DEFAULT_RETRY_INTERVAL_MS,
        };

        Ok(TelemetryConfig {
            insert_key,
            endpoint,
            retry: RetryPolicy::new(max_attempts, Duration::from_millis(interval_ms)),
        })
    }
}

impl fmt::Debug for TelemetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryConfig")
            .field("insert_key", &"<redacted>")
            .field("endpoint", &self.endpoint.as_str())
            .field("retry", &self.retry)
            .finish()
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        name: ENDPOINT_VAR,
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if url.scheme() != "https" {
        return Err(invalid(format!("scheme must be https, got {}", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

fn parse_number<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        name,
        reason: format!("{raw:?}: {e}"),
    })
}
