use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;

/// A concurrent map whose values are computed at most once per key.
///
/// Racing callers for the same key block on the first initializer and then
/// observe its value. Initializers for different keys run in parallel, and an
/// initializer may itself populate other keys.
pub(crate) struct OnceMap<K, V> {
    entries: RwLock<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K: Eq + Hash + Clone, V: Clone> OnceMap<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn get_or_init(&self, key: &K, init: impl FnOnce() -> V) -> V {
        self.cell(key).get_or_init(init).clone()
    }

    /// A failed initializer leaves the key empty; the next caller retries.
    pub(crate) fn get_or_try_init<E>(
        &self,
        key: &K,
        init: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        self.cell(key).get_or_try_init(init).cloned()
    }

    pub(crate) fn remove(&self, key: &K) {
        self.entries.write().remove(key);
    }

    pub(crate) fn retain(&self, mut keep: impl FnMut(&K) -> bool) {
        self.entries.write().retain(|key, _| keep(key));
    }

    pub(crate) fn clear(&self) {
        self.entries.write().clear();
    }

    pub(crate) fn keys(&self) -> Vec<K> {
        self.entries.read().keys().cloned().collect()
    }

    fn cell(&self, key: &K) -> Arc<OnceCell<V>> {
        if let Some(cell) = self.entries.read().get(key) {
            return Arc::clone(cell);
        }
        Arc::clone(self.entries.write().entry(key.clone()).or_default())
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for OnceMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
