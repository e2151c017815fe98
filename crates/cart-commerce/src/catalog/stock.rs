//! Stock levels reported by the catalog.

use crate::ids::ProductId;
use serde::{Deserialize, Serialize};

/// Maximum purchasable quantity of a product at lookup time.
///
/// Fetched on every quantity change and never cached.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stock {
    /// Product this level belongs to.
    pub id: ProductId,
    /// Units available.
    pub amount: i64,
}

impl Stock {
    /// Create a stock level.
    pub fn new(id: ProductId, amount: i64) -> Self {
        Self { id, amount }
    }

    /// Check if a cart quantity of `requested` can be fulfilled.
    pub fn covers(&self, requested: i64) -> bool {
        requested <= self.amount
    }

    /// Check if out of stock.
    pub fn is_out_of_stock(&self) -> bool {
        self.amount <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_covers_boundary() {
        let stock = Stock::new(ProductId::new(1), 5);
        assert!(stock.covers(1));
        assert!(stock.covers(5));
        assert!(!stock.covers(6));
        assert!(!stock.is_out_of_stock());
    }

    #[test]
    fn test_empty_stock() {
        let stock = Stock::new(ProductId::new(1), 0);
        assert!(stock.is_out_of_stock());
        assert!(!stock.covers(1));
    }

    #[test]
    fn test_stock_wire_format() {
        let stock: Stock = serde_json::from_str(r#"{"id":2,"amount":10}"#).unwrap();
        assert_eq!(stock, Stock::new(ProductId::new(2), 10));
    }
}
