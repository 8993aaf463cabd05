//! A [KeyedCache] maps keys to lazily-produced values, producing each value at most once per key.
//!
//! Values are stored behind `Arc` so that callers get the same instance back on every hit.  There is no eviction:
//! entries live until they are removed or the cache is cleared.
//!
//! This type does no locking.  The mutating operations take `&mut self`, so sharing a cache between threads means
//! wrapping it in a lock, and holding that lock across the whole miss-load-insert sequence is what keeps the
//! at-most-once guarantee.
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use ahash::RandomState;

pub struct KeyedCache<V, K = String> {
    entries: HashMap<K, Arc<V>, RandomState>,
}

impl<V, K: Hash + Eq> KeyedCache<V, K> {
    pub fn new() -> KeyedCache<V, K> {
        KeyedCache {
            entries: Default::default(),
        }
    }

    /// Return the cached value for `key`, calling `loader` to produce it if it isn't present.
    ///
    /// A failing loader leaves the cache untouched, so a later call for the same key will try again.
    pub fn get_or_load<Q, E>(
        &mut self,
        key: &Q,
        loader: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        if let Some(x) = self.entries.get(key) {
            return Ok(x.clone());
        }

        let value = Arc::new(loader()?);
        self.entries.insert(key.to_owned(), value.clone());
        Ok(value)
    }

    /// Insert a value, returning the one it replaced.
    pub fn put(&mut self, key: K, value: impl Into<Arc<V>>) -> Option<Arc<V>> {
        self.entries.insert(key, value.into())
    }

    pub fn get<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).cloned()
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.remove(key)
    }

    /// Drop every entry for which `keep` returns false.
    pub fn retain(&mut self, mut keep: impl FnMut(&K, &V) -> bool) {
        self.entries.retain(|k, v| keep(k, &**v));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }
}

impl<V, K: Hash + Eq> Default for KeyedCache<V, K> {
    fn default() -> Self {
        KeyedCache::new()
    }
}

impl<V, K: Hash + Eq + std::fmt::Debug> std::fmt::Debug for KeyedCache<V, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedCache")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
