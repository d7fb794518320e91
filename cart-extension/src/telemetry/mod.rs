//! Best-effort relay of cart line items to the telemetry ingestion endpoint.
//!
//! A cart is flattened into one [`TelemetryEvent`] per line item, serialized to a
//! JSON array, gzip-compressed once and posted with bounded retries. Nothing in
//! here is allowed to fail the cart validation that triggered it.

pub mod compress;
pub mod event;
pub mod forwarder;
pub mod sender;

pub use event::{EVENT_TYPE_PREFIX, TelemetryEvent, build_events};
pub use forwarder::{ForwardOutcome, Forwarder};
pub use sender::{HttpSender, TelemetryTransport};
