//! Type-safe key-value slot store for the cart.
//!
//! Provides a simple, ergonomic API for keeping JSON values in named slots,
//! backed either by process memory or by a directory on disk.
//!
//! # Example
//!
//! ```rust
//! use cart_cache::Cache;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Line {
//!     id: u64,
//!     amount: i64,
//! }
//!
//! let cache = Cache::in_memory();
//!
//! // Store a value
//! cache.set("@RocketShoes:cart", &vec![Line { id: 1, amount: 2 }]).unwrap();
//!
//! // Retrieve a value
//! let cart: Option<Vec<Line>> = cache.get("@RocketShoes:cart").unwrap();
//! assert_eq!(cart.map(|lines| lines.len()), Some(1));
//! ```

mod backend;
mod error;
mod kv;

pub use backend::{FileBackend, KvBackend, MemoryBackend};
pub use error::CacheError;
pub use kv::Cache;
