//! Session-scoped memo cache for upstream payloads.
//!
//! Owned by the application root and handed to whichever component needs
//! lookups. Entries are never evicted or expired; the key space (competition
//! × status, or match id) is small in practice.
//!
//! In-flight fetches for the same key are not deduplicated: two concurrent
//! misses both call the fetcher and the later write wins.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Thread-safe, clonable handle to a keyed payload cache.
#[derive(Clone)]
pub struct ResultCache<V> {
    name: &'static str,
    inner: Arc<RwLock<HashMap<String, V>>>,
}

impl<V: Clone> ResultCache<V> {
    pub fn new(name: &'static str) -> Self {
        ResultCache {
            name,
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Return the cached payload for `key`, or run `fetcher`, store a
    /// successful result and return it. Failures are not cached.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, fetcher: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(key).await {
            debug!("{} cache hit: {}", self.name, key);
            return Ok(hit);
        }

        debug!("{} cache miss: {}", self.name, key);
        // The lock is not held across the fetch.
        let value = fetcher().await?;
        self.inner
            .write()
            .await
            .insert(key.to_string(), value.clone());
        Ok(value)
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        self.inner.read().await.get(key).cloned()
    }

    #[cfg(test)]
    pub async fn contains(&self, key: &str) -> bool {
        self.inner.read().await.contains_key(key)
    }

    /// Number of cached keys.
    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
