//! Persisted mirror of the cart.

use cart_cache::{Cache, CacheError};

use crate::cart::CartState;

/// Namespace key of the persisted cart slot.
pub const DEFAULT_CART_KEY: &str = "@RocketShoes:cart";

/// Persistence port for the cart.
///
/// `save` always receives the whole cart; there is no partial write.
pub trait CartStorage: Send + Sync {
    /// Read the persisted cart. `None` when nothing was ever saved.
    fn load(&self) -> Result<Option<CartState>, CacheError>;

    /// Replace the persisted cart.
    fn save(&self, cart: &CartState) -> Result<(), CacheError>;
}

/// Cart storage in a single [`Cache`] slot.
#[derive(Debug, Clone)]
pub struct CacheCartStorage {
    cache: Cache,
    key: String,
}

impl CacheCartStorage {
    /// Store the cart under [`DEFAULT_CART_KEY`].
    pub fn new(cache: Cache) -> Self {
        Self::with_key(cache, DEFAULT_CART_KEY)
    }

    /// Store the cart under a custom key.
    pub fn with_key(cache: Cache, key: impl Into<String>) -> Self {
        Self {
            cache,
            key: key.into(),
        }
    }

    /// The slot key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl CartStorage for CacheCartStorage {
    fn load(&self) -> Result<Option<CartState>, CacheError> {
        self.cache.get(&self.key)
    }

    fn save(&self, cart: &CartState) -> Result<(), CacheError> {
        self.cache.set(&self.key, cart)
    }
}
