//! Product records as returned by the catalog and stored in the cart.

use crate::ids::ProductId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A product, doubling as a cart line item.
///
/// Only `id` and `amount` matter to the cart. Display fields such as
/// `title`, `price` and `image` are kept verbatim in `details`, so a
/// persisted cart carries whatever the catalog returned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Catalog identifier.
    pub id: ProductId,
    /// Quantity in the cart. Catalog records omit it.
    #[serde(default)]
    pub amount: i64,
    /// Display fields, opaque to the cart.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl Product {
    /// Create a product with no display fields.
    pub fn new(id: ProductId) -> Self {
        Self {
            id,
            amount: 0,
            details: Map::new(),
        }
    }

    /// Attach a display field.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Set the quantity.
    pub fn with_amount(mut self, amount: i64) -> Self {
        self.amount = amount;
        self
    }

    /// Product title, when the catalog provides one.
    pub fn title(&self) -> Option<&str> {
        self.details.get("title").and_then(Value::as_str)
    }

    /// Unit price, when the catalog provides a numeric one.
    pub fn price(&self) -> Option<f64> {
        self.details.get("price").and_then(Value::as_f64)
    }
}
