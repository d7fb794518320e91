use crate::config::TelemetryConfig;
use crate::errors::TelemetryError;
use crate::metrics_defs::TELEMETRY_ATTEMPTS;
use async_trait::async_trait;
use bytes::Bytes;
use http::header::{CONTENT_ENCODING, CONTENT_TYPE, HeaderName, HeaderValue};
use http::StatusCode;
use shared::counter;
use std::time::Duration;
use url::Url;

pub const INSERT_KEY_HEADER: HeaderName = HeaderName::from_static("x-insert-key");

/// The ingestion endpoint is always reached on the standard TLS port.
pub const TELEMETRY_PORT: u16 = 443;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on reading the body of a rejected request, which is only kept for logs.
const ERROR_BODY_TIMEOUT: Duration = Duration::from_secs(2);

/// A single delivery attempt of an already compressed payload
#[async_trait]
pub trait TelemetryTransport: Send + Sync {
    /// Posts `payload` once. Resolves with the response body on HTTP 200.
    async fn send(&self, payload: Bytes) -> Result<String, TelemetryError>;
}

/// Posts gzip-compressed JSON to the telemetry endpoint over HTTPS.
#[derive(Clone)]
pub struct HttpSender {
    client: reqwest::Client,
    url: Url,
    insert_key: HeaderValue,
}

impl HttpSender {
    pub fn new(config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        Self::with_url(target_url(&config.endpoint)?, &config.insert_key)
    }

    /// Sends to `url` as given, without forcing the TLS port.
    fn with_url(url: Url, insert_key: &str) -> Result<Self, TelemetryError> {
        let mut insert_key = HeaderValue::from_str(insert_key)
            .map_err(|e| TelemetryError::InvalidInsertKey(e.to_string()))?;
        insert_key.set_sensitive(true);

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(TelemetryError::Client)?;

        Ok(Self {
            client,
            url,
            insert_key,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Builds the POST without sending it.
    pub fn build_request(&self, payload: Bytes) -> Result<reqwest::Request, TelemetryError> {
        self.client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_ENCODING, "gzip")
            .header(INSERT_KEY_HEADER, self.insert_key.clone())
            .body(payload)
            .build()
            .map_err(TelemetryError::Client)
    }
}

#[async_trait]
impl TelemetryTransport for HttpSender {
    async fn send(&self, payload: Bytes) -> Result<String, TelemetryError> {
        let request = self.build_request(payload)?;
        counter!(TELEMETRY_ATTEMPTS).increment(1);

        let response = self
            .client
            .execute(request)
            .await
            .map_err(TelemetryError::Transport)?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "Got response");

        // Only an exact 200 counts as delivered
        if status != StatusCode::OK {
            let body = error_body(response).await;
            return Err(TelemetryError::Http { status, body });
        }

        response.text().await.map_err(TelemetryError::Transport)
    }
}

/// Best-effort read of a rejection body. A broken or slow body yields an empty string.
async fn error_body(response: reqwest::Response) -> String {
    match tokio::time::timeout(ERROR_BODY_TIMEOUT, response.text()).await {
        Ok(Ok(body)) => body,
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "Failed to read error response body");
            String::new()
        }
        Err(_) => {
            tracing::debug!("Timed out reading error response body");
            String::new()
        }
    }
}

/// Host and path of the configured endpoint on port 443. Query and fragment are dropped.
fn target_url(endpoint: &Url) -> Result<Url, TelemetryError> {
    let mut url = endpoint.clone();
    url.set_port(Some(TELEMETRY_PORT))
        .map_err(|_| TelemetryError::InvalidEndpoint(endpoint.to_string()))?;
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
