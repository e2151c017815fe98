//! Raw byte storage backends behind [`Cache`](crate::Cache).

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

use crate::CacheError;

/// A byte-oriented key-value store.
///
/// Implementations must be safe to share between threads; the cache never
/// holds a backend lock across calls.
pub trait KvBackend: Send + Sync {
    /// Read the bytes stored under `key`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Replace the bytes stored under `key`.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError>;
}

/// Process-local backend used in tests and short-lived sessions.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    /// Create an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>, CacheError> {
        self.entries
            .lock()
            .map_err(|_| CacheError::StoreError("memory store lock poisoned".to_string()))
    }
}

impl KvBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        self.lock()?.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// Directory-backed store: one file per key.
///
/// File names are the URL-safe base64 of the key, so keys such as
/// `@RocketShoes:cart` map to portable file names. Writes go through a
/// temporary file and a rename, so a reader never sees a half-written value.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

const FILE_EXTENSION: &str = "json";

impl FileBackend {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, CacheError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| CacheError::OpenError(format!("{}: {}", dir.display(), e)))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name = URL_SAFE_NO_PAD.encode(key.as_bytes());
        self.dir.join(format!("{}.{}", name, FILE_EXTENSION))
    }
}

impl KvBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        tracing::trace!(path = %path.display(), bytes = value.len(), "slot written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_set_get() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get("a").unwrap(), None);

        backend.set("a", b"one").unwrap();
        assert_eq!(backend.get("a").unwrap(), Some(b"one".to_vec()));
    }

    #[test]
    fn test_memory_overwrite() {
        let backend = MemoryBackend::new();
        backend.set("a", b"one").unwrap();
        backend.set("a", b"two").unwrap();
        assert_eq!(backend.get("a").unwrap(), Some(b"two".to_vec()));
    }

    #[test]
    fn test_file_roundtrip_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let backend = FileBackend::open(dir.path()).unwrap();
            backend.set("@RocketShoes:cart", b"[]").unwrap();
        }

        let reopened = FileBackend::open(dir.path()).unwrap();
        assert_eq!(
            reopened.get("@RocketShoes:cart").unwrap(),
            Some(b"[]".to_vec())
        );
    }

    #[test]
    fn test_file_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        assert_eq!(backend.get("nope").unwrap(), None);
    }

    #[test]
    fn test_file_open_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        FileBackend::open(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_file_names_are_portable() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        backend.set("@RocketShoes:cart", b"[]").unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["QFJvY2tldFNob2VzOmNhcnQ.json".to_string()]);
    }
}
