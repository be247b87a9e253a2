//! Bounded, optionally expiring in-memory cache shared across tasks.

use std::hash::Hash;
use std::time::Duration;

use moka::future::Cache;

/// Capacity-bounded cache over `moka`. Values are published whole on insert,
/// so readers never see a partially built entry. Concurrent fills of the same
/// key are last-writer-wins.
#[derive(Clone)]
pub struct BoundedCache<K, V> {
    inner: Cache<K, V>,
    capacity: u64,
}

impl<K, V> BoundedCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// `ttl` of `None` keeps entries until capacity eviction.
    #[must_use]
    pub fn new(capacity: u64, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder().max_capacity(capacity);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }
        Self {
            inner: builder.build(),
            capacity,
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: K, value: V) {
        self.inner.insert(key, value).await;
    }
}

impl<K, V> std::fmt::Debug for BoundedCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedCache")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

/// `0` disables expiry.
#[must_use]
pub fn ttl_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
