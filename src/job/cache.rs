// src/job/cache.rs

//! Keyed cache of per-context job singletons.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, Weak};

use tracing::debug;

use crate::pool::round::lock;

/// Hands out one shared instance per key for as long as someone holds it.
///
/// Entries are weak: once every owner drops its `Arc`, the next lookup for
/// that key creates a fresh instance. Typical use is one job per rendering
/// context that several schedulers depend on.
pub struct JobCache<K, J> {
    entries: Mutex<HashMap<K, Weak<J>>>,
}

impl<K, J> JobCache<K, J>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the live instance for `key`, or build one with `create`.
    ///
    /// `create` runs under the cache lock, so two callers racing on the same
    /// key always end up with the same instance.
    pub fn get_or_create(&self, key: &K, create: impl FnOnce(&K) -> J) -> Arc<J> {
        let mut entries = lock(&self.entries);

        if let Some(existing) = entries.get(key).and_then(Weak::upgrade) {
            return existing;
        }

        entries.retain(|_, weak| weak.strong_count() > 0);

        let created = Arc::new(create(key));
        entries.insert(key.clone(), Arc::downgrade(&created));
        debug!(cached = entries.len(), "created cached job instance");
        created
    }

    /// Live instance for `key`, if any.
    pub fn get(&self, key: &K) -> Option<Arc<J>> {
        lock(&self.entries).get(key).and_then(Weak::upgrade)
    }

    /// Number of keys whose instance is still alive.
    pub fn live_len(&self) -> usize {
        lock(&self.entries)
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

impl<K, J> Default for JobCache<K, J>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
