use crate::cart::Cart;
use crate::errors::TelemetryError;
use crate::metrics_defs::{TELEMETRY_DELIVERED, TELEMETRY_DROPPED};
use crate::retry::{RetryPolicy, retry};
use crate::telemetry::compress::gzip;
use crate::telemetry::event::build_events;
use crate::telemetry::sender::TelemetryTransport;
use bytes::Bytes;
use shared::counter;
use std::sync::Arc;
use tracing::Instrument;

/// Terminal result of one forwarding run. Informational only; never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardOutcome {
    Delivered { events: usize, attempts: u32 },
    RetriesExhausted { attempts: u32 },
    EncodingFailed,
}

/// Turns carts into telemetry payloads and delivers them with bounded retries.
#[derive(Clone)]
pub struct Forwarder {
    transport: Arc<dyn TelemetryTransport>,
    policy: RetryPolicy,
}

impl Forwarder {
    pub fn new(transport: Arc<dyn TelemetryTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Delivers the cart's events. All failures are logged and swallowed here.
    pub async fn forward(&self, cart: &Cart) -> ForwardOutcome {
        let span = tracing::info_span!("telemetry_forward", cart_id = %cart.id);

        async move {
            let (events, payload) = match encode(cart) {
                Ok(encoded) => encoded,
                Err(e) => {
                    tracing::error!("Error during payload compression");
                    tracing::error!(error = %e, kind = e.kind(), "Compression failure detail");
                    counter!(TELEMETRY_DROPPED, "reason" => "compression").increment(1);
                    return ForwardOutcome::EncodingFailed;
                }
            };

            let transport = &self.transport;
            let result = retry(&self.policy, |attempt| {
                let payload = payload.clone();
                async move {
                    tracing::debug!(attempt, bytes = payload.len(), "Sending telemetry payload");
                    transport.send(payload).await.map(|_body| attempt)
                }
            })
            .await;

            match result {
                Ok(attempts) => {
                    tracing::info!(events, attempts, "Telemetry payload successfully sent");
                    counter!(TELEMETRY_DELIVERED).increment(1);
                    ForwardOutcome::Delivered { events, attempts }
                }
                Err(e) => {
                    tracing::error!(
                        attempts = e.attempts,
                        "Max retries reached: failed to send telemetry payload"
                    );
                    tracing::error!(
                        error = %e.last_error,
                        kind = e.last_error.kind(),
                        "Delivery failure detail"
                    );
                    counter!(TELEMETRY_DROPPED, "reason" => "retries_exhausted").increment(1);
                    ForwardOutcome::RetriesExhausted {
                        attempts: e.attempts,
                    }
                }
            }
        }
        .instrument(span)
        .await
    }
}

/// Serializes and compresses the cart's events once; the result is reused by every attempt.
///
/// Serializing plain string and integer fields cannot fail in practice, so
/// `EncodingFailed` comes from compression.
fn encode(cart: &Cart) -> Result<(usize, Bytes), TelemetryError> {
    let events = build_events(cart);
    let json = serde_json::to_vec(&events)?;
    Ok((events.len(), gzip(&json)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::TelemetryEvent;
    use crate::testutils::{LogCapture, ScriptedTransport, cart_json, gunzip};
    use http::StatusCode;
    use std::time::Duration;
    use tokio::time::Instant;
    use tracing::Level;

    const INTERVAL: Duration = Duration::from_millis(2000);

    fn cart(quantities: &[u64]) -> Cart {
        serde_json::from_value(cart_json(quantities)).unwrap()
    }

    fn server_error() -> TelemetryError {
        TelemetryError::Http {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "unavailable".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivers_on_first_attempt() {
        let logs = LogCapture::install();
        let transport = ScriptedTransport::always_ok();
        let forwarder = Forwarder::new(transport.clone(), RetryPolicy::new(3, INTERVAL));

        let outcome = forwarder.forward(&cart(&[5, 4])).await;

        assert_eq!(
            outcome,
            ForwardOutcome::Delivered {
                events: 2,
                attempts: 1
            }
        );
        let payloads = transport.payloads();
        assert_eq!(payloads.len(), 1);
        let events: Vec<TelemetryEvent> = serde_json::from_slice(&gunzip(&payloads[0])).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].cart_product_quantity, 5);
        assert_eq!(events[1].cart_product_quantity, 4);
        assert_eq!(logs.count(Level::INFO), 1);
        assert_eq!(logs.count(Level::ERROR), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_second_attempt() {
        let logs = LogCapture::install();
        let transport = ScriptedTransport::new(vec![Err(server_error()), Ok(String::new())]);
        let forwarder = Forwarder::new(transport.clone(), RetryPolicy::new(3, INTERVAL));
        let start = Instant::now();

        let outcome = forwarder.forward(&cart(&[1, 2, 3])).await;

        assert_eq!(
            outcome,
            ForwardOutcome::Delivered {
                events: 3,
                attempts: 2
            }
        );
        // Exactly one retry interval elapsed
        assert_eq!(start.elapsed(), INTERVAL);
        assert_eq!(logs.count(Level::INFO), 1);
        assert_eq!(logs.count(Level::ERROR), 0);

        // Both attempts carried the identical compressed payload
        let payloads = transport.payloads();
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0], payloads[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_retries_on_persistent_server_error() {
        let logs = LogCapture::install();
        let transport = ScriptedTransport::new(vec![
            Err(server_error()),
            Err(server_error()),
            Err(server_error()),
        ]);
        let forwarder = Forwarder::new(transport.clone(), RetryPolicy::new(3, INTERVAL));
        let start = Instant::now();

        let outcome = forwarder.forward(&cart(&[2])).await;

        assert_eq!(outcome, ForwardOutcome::RetriesExhausted { attempts: 3 });
        assert_eq!(transport.payloads().len(), 3);
        assert_eq!(start.elapsed(), INTERVAL * 2);
        assert_eq!(logs.count(Level::ERROR), 2);
        assert_eq!(logs.count(Level::INFO), 0);
        assert_eq!(logs.count(Level::WARN), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_cart_sends_empty_array() {
        let transport = ScriptedTransport::always_ok();
        let forwarder = Forwarder::new(transport.clone(), RetryPolicy::new(3, INTERVAL));

        let outcome = forwarder.forward(&cart(&[])).await;

        assert_eq!(
            outcome,
            ForwardOutcome::Delivered {
                events: 0,
                attempts: 1
            }
        );
        assert_eq!(gunzip(&transport.payloads()[0]), b"[]");
    }
}
