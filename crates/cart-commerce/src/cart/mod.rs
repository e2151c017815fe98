//! Shopping cart module.
//!
//! Contains the cart contents, its persisted mirror, the notices shown on
//! failure, and the store that ties them to the catalog.

mod cart;
mod notify;
mod storage;
mod store;

pub use cart::CartState;
pub use notify::{Notice, Notifier, TracingNotifier};
pub use storage::{CacheCartStorage, CartStorage, DEFAULT_CART_KEY};
pub use store::{CartOutcome, CartStore, UpdateProductAmount};
