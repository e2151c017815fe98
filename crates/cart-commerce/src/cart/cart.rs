//! The cart's line items.

use crate::catalog::Product;
use crate::ids::ProductId;
use serde::{Deserialize, Serialize};

/// Ordered cart contents.
///
/// Newest entries come first. Serializes as a bare JSON array of products,
/// which is also the persisted shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct CartState {
    items: Vec<Product>,
}

impl CartState {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from items, newest first.
    pub fn from_items(items: Vec<Product>) -> Self {
        Self { items }
    }

    /// Line items, newest first.
    pub fn items(&self) -> &[Product] {
        &self.items
    }

    /// Iterate over line items, newest first.
    pub fn iter(&self) -> std::slice::Iter<'_, Product> {
        self.items.iter()
    }

    /// Get the entry for a product.
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.items.iter().find(|p| p.id == id)
    }

    /// Check if a product has an entry.
    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Number of distinct products.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all quantities.
    pub fn total_amount(&self) -> i64 {
        self.items.iter().map(|p| p.amount).sum()
    }

    /// Put a new entry in front. Callers guarantee the id is not present.
    pub(crate) fn prepend(&mut self, product: Product) {
        debug_assert!(!self.contains(product.id));
        self.items.insert(0, product);
    }

    /// Set an entry's quantity. Returns false when the id has no entry.
    pub(crate) fn set_amount(&mut self, id: ProductId, amount: i64) -> bool {
        match self.items.iter_mut().find(|p| p.id == id) {
            Some(item) => {
                item.amount = amount;
                true
            }
            None => false,
        }
    }

    /// Drop an entry, keeping the others in order.
    pub(crate) fn remove(&mut self, id: ProductId) -> bool {
        let len_before = self.items.len();
        self.items.retain(|p| p.id != id);
        self.items.len() < len_before
    }
}

impl<'a> IntoIterator for &'a CartState {
    type Item = &'a Product;
    type IntoIter = std::slice::Iter<'a, Product>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
