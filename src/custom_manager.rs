//! Caller-supplied data of any type, stored by key.  Nothing is ever loaded from a source.
use std::sync::Arc;

use crate::KeyedCache;

pub struct CustomManager<T> {
    entries: KeyedCache<T>,
}

impl<T> Default for CustomManager<T> {
    fn default() -> Self {
        CustomManager {
            entries: KeyedCache::new(),
        }
    }
}

impl<T> CustomManager<T> {
    pub fn new() -> CustomManager<T> {
        Default::default()
    }

    pub fn put(&mut self, key: &str, value: impl Into<Arc<T>>) {
        self.entries.put(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        self.entries.get(key)
    }

    /// Get the value for `key`, building it with `make` if it isn't present.
    pub fn get_or_insert_with(&mut self, key: &str, make: impl FnOnce() -> T) -> Arc<T> {
        match self
            .entries
            .get_or_load(key, || Ok::<_, std::convert::Infallible>(make()))
        {
            Ok(x) => x,
            Err(never) => match never {},
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.entries.remove(key);
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
}
