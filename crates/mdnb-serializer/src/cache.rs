//! Content-addressed document cache using moka
//!
//! Parsed documents keyed by the Blake3 hash of their source bytes.
//! Entries hold the parse result before identity assignment, so one entry
//! serves every identity policy.

use mdnb_document::{ContentHash, Document};
use moka::sync::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default number of cached documents
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Statistics for cache performance monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to parse
    pub misses: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Content-addressed document cache
///
/// Cloning shares the underlying cache.
#[derive(Debug, Clone)]
pub struct DocumentCache {
    inner: Cache<ContentHash, Arc<Document>>,
    counters: Arc<Counters>,
}

impl DocumentCache {
    /// Create new cache with max capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
            counters: Arc::default(),
        }
    }

    /// Try to get or compute document
    ///
    /// Failed computations are not cached.
    ///
    /// # Errors
    /// Whatever `f` returns.
    pub fn try_get_or_insert_with<E, F>(&self, hash: ContentHash, f: F) -> Result<Arc<Document>, E>
    where
        F: FnOnce() -> Result<Document, E>,
    {
        if let Some(cached) = self.inner.get(&hash) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("document cache hit {}", hash.short());
            return Ok(cached);
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        let document = Arc::new(f()?);
        self.inner.insert(hash, Arc::clone(&document));
        Ok(document)
    }

    /// Get cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.inner.entry_count(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for DocumentCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_after_miss() {
        let cache = DocumentCache::new(16);
        let hash = ContentHash::compute(b"# doc");

        let first: Result<_, ()> =
            cache.try_get_or_insert_with(hash, || Ok(Document::new().with_markup("# doc")));
        let second: Result<_, ()> =
            cache.try_get_or_insert_with(hash, || panic!("must be cached"));

        assert_eq!(first.unwrap(), second.unwrap());
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[test]
    fn errors_are_not_cached() {
        let cache = DocumentCache::new(16);
        let hash = ContentHash::compute(b"bad");
        let result = cache.try_get_or_insert_with(hash, || Err("boom"));
        assert_eq!(result.unwrap_err(), "boom");

        let retried: Result<_, &str> = cache.try_get_or_insert_with(hash, || Ok(Document::new()));
        assert!(retried.is_ok());
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn clones_share_entries() {
        let cache = DocumentCache::default();
        let shared = cache.clone();
        let hash = ContentHash::compute(b"x");
        let _: Result<_, ()> = cache.try_get_or_insert_with(hash, || Ok(Document::new()));
        let _: Result<_, ()> = shared.try_get_or_insert_with(hash, || panic!("must be cached"));
        assert_eq!(shared.stats().hits, 1);
    }
}
