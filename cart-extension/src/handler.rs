use crate::cart::{ExtensionRequest, MAX_CART_ITEMS};
use crate::metrics_defs::CARTS_VALIDATED;
use crate::telemetry::{ForwardOutcome, Forwarder};
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{Response, StatusCode};
use serde_json::json;
use shared::counter;
use tokio::task::JoinHandle;

pub const INVALID_INPUT: &str = "InvalidInput";

pub fn too_many_items_message() -> String {
    format!("You can not put more than {MAX_CART_ITEMS} items into the cart.")
}

/// Validates carts and triggers telemetry for the accepted ones.
#[derive(Clone)]
pub struct CartHandler {
    forwarder: Forwarder,
}

impl CartHandler {
    pub fn new(forwarder: Forwarder) -> Self {
        Self { forwarder }
    }

    /// Decides the response for `body` and, for accepted carts, starts
    /// forwarding in a background task. Must run inside a tokio runtime.
    pub fn handle(&self, body: &[u8]) -> Invocation {
        let request = match ExtensionRequest::from_slice(body) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Rejecting malformed cart payload");
                counter!(CARTS_VALIDATED, "result" => "malformed").increment(1);
                return Invocation::finished(error_response(&e.to_string()));
            }
        };

        let cart = request.resource.obj;
        let items_total = cart.items_total();
        tracing::debug!(
            action = request.action.as_deref().unwrap_or("unknown"),
            cart_id = %cart.id,
            items_total,
            "Validating cart"
        );

        if cart.exceeds_item_limit() {
            counter!(CARTS_VALIDATED, "result" => "rejected").increment(1);
            return Invocation::finished(error_response(&too_many_items_message()));
        }

        counter!(CARTS_VALIDATED, "result" => "accepted").increment(1);
        let forwarder = self.forwarder.clone();
        let forwarding = tokio::spawn(async move { forwarder.forward(&cart).await });

        Invocation {
            response: Response::new(Bytes::new()),
            forwarding: Some(forwarding),
        }
    }
}

/// The caller-facing response plus the telemetry work it triggered, if any.
pub struct Invocation {
    response: Response<Bytes>,
    forwarding: Option<JoinHandle<ForwardOutcome>>,
}

impl Invocation {
    fn finished(response: Response<Bytes>) -> Self {
        Self {
            response,
            forwarding: None,
        }
    }

    pub fn response(&self) -> &Response<Bytes> {
        &self.response
    }

    pub fn is_forwarding(&self) -> bool {
        self.forwarding.is_some()
    }

    /// Hands out the response and detaches the forwarding task.
    pub fn into_response(self) -> Response<Bytes> {
        self.response
    }

    /// Waits for any forwarding to finish. The response is returned unchanged.
    pub async fn complete(self) -> (Response<Bytes>, Option<ForwardOutcome>) {
        let outcome = match self.forwarding {
            Some(task) => match task.await {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    tracing::error!("Telemetry task failed: {e}");
                    None
                }
            },
            None => None,
        };
        (self.response, outcome)
    }
}

fn error_response(message: &str) -> Response<Bytes> {
    let body = json!({
        "errors": [{
            "code": INVALID_INPUT,
            "message": message,
        }]
    });

    let mut response = Response::new(Bytes::from(body.to_string()));
    *response.status_mut() = StatusCode::BAD_REQUEST;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
