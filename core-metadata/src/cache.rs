//! Per-provider lookup memoization
//!
//! Each provider owns one [`ProviderCache`] keyed by
//! [`TrackQuery::cache_key`](crate::query::TrackQuery::cache_key). Entries
//! never expire; a bounded cache evicts the least recently used entry once
//! its capacity is reached.
//!
//! Concurrent lookups of the same key may both miss and both populate the
//! cache. Results for identical keys are equivalent, so the last write wins.

use crate::query::MetadataResult;
use lru::LruCache;
use std::num::NonZeroUsize;
use tokio::sync::RwLock;
use tracing::trace;

/// Default number of entries kept per provider
pub const DEFAULT_CAPACITY: usize = 1024;

pub struct ProviderCache {
    entries: RwLock<LruCache<String, MetadataResult>>,
    capacity: Option<NonZeroUsize>,
}

impl ProviderCache {
    /// Creates a bounded cache. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            capacity: Some(capacity),
        }
    }

    /// Creates a cache that keeps every entry for the lifetime of the process.
    pub fn unbounded() -> Self {
        Self {
            entries: RwLock::new(LruCache::unbounded()),
            capacity: None,
        }
    }

    /// Bounded when `capacity` is `Some`, unbounded otherwise
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        match capacity {
            Some(capacity) => Self::new(capacity),
            None => Self::unbounded(),
        }
    }

    pub async fn get(&self, key: &str) -> Option<MetadataResult> {
        // LRU lookups reorder entries, so even reads take the write lock
        let mut entries = self.entries.write().await;
        let hit = entries.get(key).cloned();
        trace!(key, hit = hit.is_some(), "Provider cache lookup");
        hit
    }

    pub async fn put(&self, key: impl Into<String>, result: MetadataResult) {
        let mut entries = self.entries.write().await;
        if let Some((evicted, _)) = entries.push(key.into(), result) {
            trace!(key = %evicted, "Provider cache entry replaced or evicted");
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Maximum number of entries, `None` when unbounded
    pub fn capacity(&self) -> Option<usize> {
        self.capacity.map(NonZeroUsize::get)
    }
}

impl Default for ProviderCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
