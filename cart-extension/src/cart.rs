//! Cart documents as delivered by the commerce platform's API extension call.
//!
//! Only the fields the extension reads are modelled. Unknown fields are ignored.

use crate::errors::ValidationError;
use serde::Deserialize;
use std::collections::HashMap;

/// Carts holding more items than this are rejected.
pub const MAX_CART_ITEMS: u64 = 10;

/// Envelope posted by the platform: `{ action, resource: { typeId, id, obj } }`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ExtensionRequest {
    pub action: Option<String>,
    pub resource: Resource,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub type_id: Option<String>,
    pub obj: Cart,
}

impl ExtensionRequest {
    pub fn from_slice(body: &[u8]) -> Result<Self, ValidationError> {
        Ok(serde_json::from_slice(body)?)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: String,
    pub customer_id: Option<String>,
    #[serde(rename = "type")]
    pub cart_type: String,
    pub total_price: Money,
    pub country: Option<String>,
    pub line_items: Vec<LineItem>,
}

impl Cart {
    /// Sum of all line item quantities. Saturates instead of overflowing.
    pub fn items_total(&self) -> u64 {
        self.line_items
            .iter()
            .fold(0u64, |acc, item| acc.saturating_add(item.quantity))
    }

    pub fn exceeds_item_limit(&self) -> bool {
        self.items_total() > MAX_CART_ITEMS
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LineItem {
    pub quantity: u64,
    pub name: LocalizedString,
    pub price: Price,
}

/// Localized product name. The English entry is mandatory.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LocalizedString {
    pub en: String,
    #[serde(flatten)]
    pub other: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Price {
    pub value: Money,
}

/// Integer amount in the currency's minor unit
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub cent_amount: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{cart_json, extension_body};

    #[test]
    fn test_parse_extension_request() {
        let body = extension_body(&[5, 4]);
        let request = ExtensionRequest::from_slice(&body).unwrap();
        assert_eq!(request.action.as_deref(), Some("Update"));
        assert_eq!(request.resource.type_id.as_deref(), Some("cart"));

        let cart = request.resource.obj;
        assert_eq!(cart.id, "cart-1");
        assert_eq!(cart.customer_id.as_deref(), Some("customer-1"));
        assert_eq!(cart.cart_type, "Cart");
        assert_eq!(cart.total_price.cent_amount, 12_345);
        assert_eq!(cart.country.as_deref(), Some("DE"));
        assert_eq!(cart.line_items.len(), 2);
        assert_eq!(cart.line_items[0].name.en, "Product 0");
        assert_eq!(cart.line_items[0].name.other.get("de").unwrap(), "Produkt 0");
        assert_eq!(cart.line_items[1].price.value.cent_amount, 1_100);
    }

    #[test]
    fn test_items_total_threshold() {
        let cart = |quantities: &[u64]| -> Cart {
            serde_json::from_value(cart_json(quantities)).unwrap()
        };

        assert_eq!(cart(&[5, 4]).items_total(), 9);
        assert!(!cart(&[5, 4]).exceeds_item_limit());
        assert!(!cart(&[10]).exceeds_item_limit());
        assert!(cart(&[11]).exceeds_item_limit());
        assert!(cart(&[6, 5]).exceeds_item_limit());
        assert_eq!(cart(&[]).items_total(), 0);
        assert_eq!(cart(&[u64::MAX, 1]).items_total(), u64::MAX);
    }

    #[test]
    fn test_anonymous_cart_fields_optional() {
        let mut json = cart_json(&[1]);
        let obj = json.as_object_mut().unwrap();
        obj.remove("customerId");
        obj.remove("country");

        let cart: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(cart.customer_id, None);
        assert_eq!(cart.country, None);
    }

    #[test]
    fn test_malformed_payloads_rejected() {
        assert!(ExtensionRequest::from_slice(b"not json").is_err());
        assert!(ExtensionRequest::from_slice(b"{}").is_err());

        let mut missing_name = cart_json(&[1]);
        missing_name["lineItems"][0]["name"]
            .as_object_mut()
            .unwrap()
            .remove("en");
        assert!(serde_json::from_value::<Cart>(missing_name).is_err());

        let mut negative = cart_json(&[1]);
        negative["lineItems"][0]["quantity"] = serde_json::json!(-2);
        assert!(serde_json::from_value::<Cart>(negative).is_err());
    }
}
