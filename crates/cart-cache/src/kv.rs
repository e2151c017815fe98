//! Key-Value store wrapper with automatic serialization.

use std::path::Path;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use crate::backend::{FileBackend, KvBackend, MemoryBackend};
use crate::CacheError;

/// Type-safe cache over a [`KvBackend`].
///
/// Provides automatic JSON serialization for any type that implements
/// `Serialize` and `DeserializeOwned`. Cloning a `Cache` shares the
/// underlying backend.
#[derive(Clone)]
pub struct Cache {
    backend: Arc<dyn KvBackend>,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").finish_non_exhaustive()
    }
}

impl Cache {
    /// Wrap an arbitrary backend.
    pub fn new(backend: impl KvBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Open a process-local store.
    ///
    /// # Example
    ///
    /// ```rust
    /// let cache = cart_cache::Cache::in_memory();
    /// cache.set("greeting", &"hello").unwrap();
    /// ```
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Open a directory-backed store, creating the directory if needed.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let cache = Cache::open(".cart")?;
    /// ```
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, CacheError> {
        Ok(Self::new(FileBackend::open(dir)?))
    }

    /// Get a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let cart: Option<Vec<Product>> = cache.get("@RocketShoes:cart")?;
    /// ```
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.backend.get(key)? {
            Some(bytes) => {
                let value: T = serde_json::from_slice(&bytes)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Set a value in the cache, replacing any previous value.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// cache.set("@RocketShoes:cart", &items)?;
    /// ```
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        self.backend.set(key, &bytes)
    }
}
