//! Shopping cart state for a storefront client.
//!
//! This crate tracks which products a shopper has selected and how many,
//! checks every quantity change against a remote stock service, and mirrors
//! the cart to a persisted slot so it survives restarts:
//!
//! - **Catalog**: product records, stock levels, and where they come from
//! - **Cart**: cart contents, persistence port, notices, and [`CartStore`]
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cart_commerce::prelude::*;
//!
//! let catalog = RestCatalog::new(FetchClient::new().with_base_url("http://localhost:3333"));
//! let storage = CacheCartStorage::new(Cache::open(".cart")?);
//! let store = CartStore::hydrate(Arc::new(catalog), Arc::new(storage))?;
//!
//! match store.add_product(ProductId::new(1)).await {
//!     Ok(_) => println!("{} items", store.cart().total_amount()),
//!     Err(err) => eprintln!("{}", err.notice()),
//! }
//! ```

pub mod error;
pub mod ids;

pub mod cart;
pub mod catalog;

pub use cart::{CartOutcome, CartState, CartStore, UpdateProductAmount};
pub use error::{CartError, FailureCause};
pub use ids::ProductId;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{CartError, FailureCause};
    pub use crate::ids::ProductId;

    // Catalog
    pub use crate::catalog::{CatalogSource, InMemoryCatalog, Product, RestCatalog, Stock};

    // Cart
    pub use crate::cart::{
        CacheCartStorage, CartOutcome, CartState, CartStorage, CartStore, Notice, Notifier,
        TracingNotifier, UpdateProductAmount, DEFAULT_CART_KEY,
    };

    // Collaborator crates
    pub use cart_cache::Cache;
    pub use cart_data::FetchClient;
}
