//! Caching layer for retrieval.
//!
//! Embedding and vector-search round trips are the most expensive part of a
//! request after generation itself; identical queries inside a short window
//! are common (a user tabbing between fields of the same project).

use moka::future::Cache;
use scribe_core::ReferenceCase;
use std::hash::{Hash, Hasher};
use std::time::Duration;

/// Cache key for a retrieval.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    query_hash: u64,
    field_hash: u64,
    approved_only: bool,
    limit: usize,
}

impl CacheKey {
    /// Create a cache key from retrieval inputs.
    pub fn new(query: &str, field: Option<&str>, approved_only: bool, limit: usize) -> Self {
        Self {
            query_hash: hash_str(query),
            field_hash: field.map(hash_str).unwrap_or(0),
            approved_only,
            limit,
        }
    }
}

fn hash_str(text: &str) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

/// Retrieval cache using moka.
pub struct RetrievalCache {
    cache: Cache<CacheKey, Vec<ReferenceCase>>,
}

impl RetrievalCache {
    /// Create a new cache with the given bounds.
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    /// Get cached cases.
    pub async fn get(&self, key: &CacheKey) -> Option<Vec<ReferenceCase>> {
        self.cache.get(key).await
    }

    /// Store cases.
    pub async fn insert(&self, key: CacheKey, cases: Vec<ReferenceCase>) {
        self.cache.insert(key, cases).await;
    }

    /// Drop everything cached.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Number of cached entries.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for RetrievalCache {
    fn default() -> Self {
        Self::new(1024, Duration::from_secs(300))
    }
}
