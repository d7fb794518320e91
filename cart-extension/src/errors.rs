use http::StatusCode;
use thiserror::Error;

/// Result type alias for cart-extension service operations
pub type Result<T, E = CartExtensionError> = std::result::Result<T, E>;

/// Errors raised by the HTTP service hosting the extension
#[derive(Error, Debug)]
pub enum CartExtensionError {
    #[error("Failed to read request body: {0}")]
    RequestBodyError(String),

    #[error("Hyper error: {0}")]
    HyperError(#[from] hyper::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Telemetry setup error: {0}")]
    Telemetry(#[from] TelemetryError),
}

/// A cart document that does not match the commerce platform's schema
#[derive(Error, Debug)]
#[error("Malformed cart payload: {0}")]
pub struct ValidationError(#[from] serde_json::Error);

/// Failures of a single telemetry delivery step
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("failed to compress payload: {0}")]
    Compression(#[source] std::io::Error),

    #[error("failed to serialize events: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected response status {status}")]
    Http { status: StatusCode, body: String },

    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid telemetry endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("insert key is not a valid header value: {0}")]
    InvalidInsertKey(String),
}

impl TelemetryError {
    /// Short label used to tag metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TelemetryError::Compression(_) => "compression",
            TelemetryError::Serialization(_) => "serialization",
            TelemetryError::Transport(_) => "transport",
            TelemetryError::Http { .. } => "http",
            TelemetryError::Client(_) => "client",
            TelemetryError::InvalidEndpoint(_) => "endpoint",
            TelemetryError::InvalidInsertKey(_) => "insert_key",
        }
    }
}

/// Terminal failure of the retry executor, carrying the last attempt's error
#[derive(Error, Debug)]
#[error("giving up after {attempts} attempts: {last_error}")]
pub struct RetriesExhausted<E: std::error::Error + 'static> {
    pub attempts: u32,
    #[source]
    pub last_error: E,
}

/// Invalid or missing telemetry settings in the environment
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("environment variable {name} is not valid: {reason}")]
    Invalid { name: &'static str, reason: String },
}
