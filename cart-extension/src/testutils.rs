use crate::errors::TelemetryError;
use crate::telemetry::TelemetryTransport;
use async_trait::async_trait;
use bytes::Bytes;
use flate2::read::GzDecoder;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::io::Read;
use std::sync::{Arc, Mutex};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// A cart document with one line item per entry in `quantities`.
pub fn cart_json(quantities: &[u64]) -> Value {
    let line_items: Vec<Value> = quantities
        .iter()
        .enumerate()
        .map(|(i, quantity)| {
            json!({
                "id": format!("line-{i}"),
                "quantity": quantity,
                "name": {"en": format!("Product {i}"), "de": format!("Produkt {i}")},
                "price": {"value": {"currencyCode": "EUR", "centAmount": 1000 + 100 * i}}
            })
        })
        .collect();

    json!({
        "id": "cart-1",
        "version": 4,
        "customerId": "customer-1",
        "type": "Cart",
        "totalPrice": {"currencyCode": "EUR", "centAmount": 12345},
        "country": "DE",
        "lineItems": line_items
    })
}

/// The API extension envelope wrapping `cart_json(quantities)`.
pub fn extension_body(quantities: &[u64]) -> Vec<u8> {
    json!({
        "action": "Update",
        "resource": {"typeId": "cart", "id": "cart-1", "obj": cart_json(quantities)}
    })
    .to_string()
    .into_bytes()
}

pub fn gunzip(data: &[u8]) -> Vec<u8> {
    let mut decoded = Vec::new();
    GzDecoder::new(data).read_to_end(&mut decoded).unwrap();
    decoded
}

/// Transport that replays a fixed list of outcomes and records every payload.
/// Once the script runs out every send succeeds.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<String, TelemetryError>>>,
    payloads: Mutex<Vec<Bytes>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<String, TelemetryError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            payloads: Mutex::new(Vec::new()),
        })
    }

    pub fn always_ok() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn payloads(&self) -> Vec<Bytes> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl TelemetryTransport for ScriptedTransport {
    async fn send(&self, payload: Bytes) -> Result<String, TelemetryError> {
        self.payloads.lock().unwrap().push(payload);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }
}

/// Records the level of every event emitted on the current thread while alive.
pub struct LogCapture {
    levels: Arc<Mutex<Vec<Level>>>,
    _guard: DefaultGuard,
}

impl LogCapture {
    pub fn install() -> Self {
        let levels = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(LevelRecorder {
            levels: levels.clone(),
        });
        let guard = tracing::subscriber::set_default(subscriber);
        Self {
            levels,
            _guard: guard,
        }
    }

    pub fn count(&self, level: Level) -> usize {
        self.levels
            .lock()
            .unwrap()
            .iter()
            .filter(|l| **l == level)
            .count()
    }
}

struct LevelRecorder {
    levels: Arc<Mutex<Vec<Level>>>,
}

impl<S: Subscriber> Layer<S> for LevelRecorder {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.levels.lock().unwrap().push(*event.metadata().level());
    }
}
