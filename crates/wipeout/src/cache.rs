//! Cache abstractions for storing file contents.
//!
//! The loader reads every file whole; a cache lets repeated loads of the
//! same container skip the filesystem.
//!
//! # Implementations
//!
//! - [`MemoryCache`]: In-memory cache with optional size limits
//! - [`NoCache`]: Passthrough implementation that caches nothing

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
};

use crate::error::{Error, Result};

/// A cache for storing file contents.
///
/// The cache is keyed by path and stores raw bytes.
pub trait Cache: Send + Sync {
    /// Get data from the cache.
    ///
    /// Returns `Ok(Some(data))` if the data is cached, `Ok(None)` if not cached,
    /// or an error if the cache operation failed.
    fn get(&self, path: &Path) -> Result<Option<Vec<u8>>>;

    /// Store data in the cache.
    ///
    /// Implementations copy `data` only if they keep it.
    fn put(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Check if data exists in the cache without retrieving it.
    fn contains(&self, path: &Path) -> Result<bool>;

    /// Remove data from the cache.
    fn remove(&self, path: &Path) -> Result<()>;

    /// Clear all cached data.
    fn clear(&self) -> Result<()>;
}

/// A cache that stores nothing (passthrough).
#[derive(Debug, Clone, Default)]
pub struct NoCache;

impl NoCache {
    /// Create a new no-op cache.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Cache for NoCache {
    fn get(&self, _path: &Path) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    fn put(&self, _path: &Path, _data: &[u8]) -> Result<()> {
        Ok(())
    }

    fn contains(&self, _path: &Path) -> Result<bool> {
        Ok(false)
    }

    fn remove(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        Ok(())
    }
}

/// An in-memory cache.
///
/// This cache stores data in a `HashMap` protected by a `RwLock`, so one
/// cache can back a loader shared between threads.
///
/// The cache has an optional maximum size in bytes. When the limit is exceeded,
/// the oldest entries are evicted.
#[derive(Debug)]
pub struct MemoryCache {
    data: Arc<RwLock<MemoryCacheInner>>,
    max_size: Option<usize>,
}

#[derive(Debug, Default)]
struct MemoryCacheInner {
    entries: HashMap<PathBuf, Vec<u8>>,
    /// Insertion order for eviction.
    order: Vec<PathBuf>,
    current_size: usize,
}

impl MemoryCacheInner {
    fn remove(&mut self, path: &Path) {
        if let Some(old) = self.entries.remove(path) {
            self.current_size -= old.len();
            self.order.retain(|k| k != path);
        }
    }
}

fn poisoned<T>(operation: &'static str) -> impl FnOnce(PoisonError<T>) -> Error {
    move |e| Error::Cache {
        operation,
        message: e.to_string(),
    }
}

impl MemoryCache {
    /// Create a new memory cache with no size limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(MemoryCacheInner::default())),
            max_size: None,
        }
    }

    /// Create a new memory cache with a maximum size in bytes.
    #[must_use]
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            data: Arc::new(RwLock::new(MemoryCacheInner::default())),
            max_size: Some(max_size),
        }
    }

    /// Get the current size of cached data in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.read().map_or(0, |inner| inner.current_size)
    }

    /// Get the number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().map_or(0, |inner| inner.entries.len())
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemoryCache {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            max_size: self.max_size,
        }
    }
}

impl Cache for MemoryCache {
    fn get(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        let inner = self.data.read().map_err(poisoned("get"))?;
        Ok(inner.entries.get(path).cloned())
    }

    fn put(&self, path: &Path, data: &[u8]) -> Result<()> {
        let mut inner = self.data.write().map_err(poisoned("put"))?;
        inner.remove(path);

        let data_size = data.len();
        if let Some(max_size) = self.max_size {
            while inner.current_size + data_size > max_size && !inner.order.is_empty() {
                let oldest = inner.order.remove(0);
                if let Some(old) = inner.entries.remove(&oldest) {
                    inner.current_size -= old.len();
                }
            }
        }

        inner.entries.insert(path.to_path_buf(), data.to_vec());
        inner.order.push(path.to_path_buf());
        inner.current_size += data_size;
        Ok(())
    }

    fn contains(&self, path: &Path) -> Result<bool> {
        let inner = self.data.read().map_err(poisoned("contains"))?;
        Ok(inner.entries.contains_key(path))
    }

    fn remove(&self, path: &Path) -> Result<()> {
        self.data.write().map_err(poisoned("remove"))?.remove(path);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut inner = self.data.write().map_err(poisoned("clear"))?;
        inner.entries.clear();
        inner.order.clear();
        inner.current_size = 0;
        Ok(())
    }
}
