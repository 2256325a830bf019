//! Bounded in-memory cache trimmed by insertion order.
//!
//! Shared by the mood analyzer and the chatbot reply cache. Entries never
//! expire on their own; the oldest insertion goes first once the cache is
//! over capacity.

use std::{hash::Hash, sync::Arc};

use indexmap::IndexMap;
use parking_lot::Mutex;

#[derive(Clone)]
pub struct BoundedCache<K, V> {
    inner: Arc<Mutex<IndexMap<K, V>>>,
    capacity: usize,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Mutex::new(IndexMap::with_capacity(capacity.min(1024)))),
            capacity,
        }
    }

    /// Insert or replace. A replaced key moves to the newest position.
    pub fn insert(&self, key: K, value: V) {
        let mut map = self.inner.lock();
        map.shift_remove(&key);
        map.insert(key, value);
        while map.len() > self.capacity {
            map.shift_remove_index(0);
        }
    }

    /// Lookups do not refresh an entry's position.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
