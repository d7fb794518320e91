use crate::cart::Cart;
use serde::{Deserialize, Serialize};

/// Prepended to the cart type to form the event type, e.g. `sunriseCart`.
pub const EVENT_TYPE_PREFIX: &str = "sunrise";

/// One flattened analytics record per cart line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEvent {
    pub event_type: String,
    pub cart_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart_customer_id: Option<String>,
    pub cart_total_price: i64,
    /// The English product name, itself JSON-encoded (quotes included).
    pub cart_product: String,
    pub cart_product_quantity: u64,
    pub cart_product_price: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart_country: Option<String>,
}

/// Builds the events for `cart`, preserving line item order.
pub fn build_events(cart: &Cart) -> Vec<TelemetryEvent> {
    let event_type = format!("{EVENT_TYPE_PREFIX}{}", cart.cart_type);

    cart.line_items
        .iter()
        .map(|item| TelemetryEvent {
            event_type: event_type.clone(),
            cart_id: cart.id.clone(),
            cart_customer_id: cart.customer_id.clone(),
            cart_total_price: cart.total_price.cent_amount,
            cart_product: json_string(&item.name.en),
            cart_product_quantity: item.quantity,
            cart_product_price: item.price.value.cent_amount,
            cart_country: cart.country.clone(),
        })
        .collect()
}

/// JSON string literal for `s`, quotes and escapes included.
fn json_string(s: &str) -> String {
    serde_json::Value::String(s.to_owned()).to_string()
}
