//! Keyed caches for documents and raw content.
//!
//! A [`KeyedCache`] is a flat map from string key to a previously computed
//! value. Entries are never evicted: they live as long as the
//! [`ResolutionContext`](crate::document::ResolutionContext) that owns the
//! cache, which is one page load for the CLI.
//!
//! Two independent instances are used by the resolution engine:
//! - the **document registry** (path → canonical `Arc<Document>`)
//! - the **content cache** (path → raw fetched text)
//!
//! They are kept as separate instances so an asset path and a document path
//! can never collide.
//!
//! # Concurrency
//!
//! The cache is backed by [`DashMap`], so membership checks and insertion are
//! safe from concurrent tasks. [`KeyedCache::get_or_insert_with`] performs the
//! check-then-insert under the shard lock, which is what guarantees a single
//! canonical instance per key when two first-time lookups race.

use dashmap::DashMap;
use std::fmt;

/// String-keyed cache with no eviction and no capacity bound.
pub struct KeyedCache<V> {
    /// Namespace label used in trace logs ("documents", "content", ...)
    name: &'static str,
    entries: DashMap<String, V>,
}

impl<V: Clone> KeyedCache<V> {
    /// Create an empty cache labelled `name` for logging.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: DashMap::new(),
        }
    }

    /// Store `value` under `key`, overwriting any previous entry.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.entries.insert(key.into(), value);
    }

    /// Report whether `key` is present.
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Return a clone of the stored value, or `None` if absent.
    pub fn get(&self, key: &str) -> Option<V> {
        let value = self.entries.get(key).map(|entry| entry.value().clone());
        tracing::trace!(
            target: "cache",
            "{} cache {} for {}",
            self.name,
            if value.is_some() { "hit" } else { "miss" },
            key
        );
        value
    }

    /// Return the stored value for `key`, inserting `init()` first if absent.
    ///
    /// The check and the insert happen atomically, so concurrent callers
    /// always observe the same value.
    pub fn get_or_insert_with(&self, key: &str, init: impl FnOnce() -> V) -> V {
        if let Some(existing) = self.entries.get(key) {
            return existing.value().clone();
        }
        self.entries
            .entry(key.to_string())
            .or_insert_with(|| {
                tracing::trace!(target: "cache", "{} cache insert {}", self.name, key);
                init()
            })
            .value()
            .clone()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All cached keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }
}

impl<V> fmt::Debug for KeyedCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedCache")
            .field("name", &self.name)
            .field("len", &self.entries.len())
            .finish()
    }
}
