//! Expiring key-value cache
//!
//! Entries carry their own deadline and are evicted lazily, when a read finds
//! them stale. There is no background sweep: a key that is never read again
//! stays in memory until it is overwritten or [`TtlCache::clear`] is called.

use dashmap::DashMap;
use std::borrow::Borrow;
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;

/// A cached value and the instant it stops being served
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Cached value
    pub value: V,
    /// First instant at which the entry is stale
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Key-value store whose entries expire after a fixed lifetime.
///
/// A zero TTL disables the cache: `get` always misses and `put` stores
/// nothing.
#[derive(Debug)]
pub struct TtlCache<K, V>
where
    K: Eq + Hash,
{
    ttl: Duration,
    entries: DashMap<K, CacheEntry<V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache whose entries live for `ttl`
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Create a cache that never stores anything
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Entry lifetime
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether this cache stores anything at all
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Return the live value for `key`, evicting it if it has expired.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        if !self.is_enabled() {
            return None;
        }
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.is_live(now) {
                return Some(entry.value.clone());
            }
        } else {
            return None;
        }
        // A racing put may have replaced the stale entry; only drop it if it
        // is still expired.
        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        None
    }

    /// Store `value` under `key`, replacing any previous entry.
    ///
    /// `None` is ignored, so optional lookups can be cached without a branch
    /// at the call site.
    pub fn put(&self, key: K, value: impl Into<Option<V>>) {
        if !self.is_enabled() {
            return;
        }
        let Some(value) = value.into() else {
            return;
        };
        let expires_at = Instant::now() + self.ttl;
        self.entries.insert(key, CacheEntry { value, expires_at });
    }

    /// Drop an entry regardless of its age
    pub fn invalidate<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.remove(key);
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of stored entries, stale ones included
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
