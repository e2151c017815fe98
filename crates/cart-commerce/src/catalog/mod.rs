//! Product catalog module.
//!
//! Contains product records, stock levels, and the sources they are
//! fetched from.

mod product;
mod source;
mod stock;

pub use product::Product;
pub use source::{CatalogSource, InMemoryCatalog, RestCatalog};
pub use stock::Stock;
