//! Cross-rule memoization store shared by all evaluators in one pass.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

/// Clonable handle to the pass-wide memoization store.
///
/// The orchestrator creates one store per validation pass and hands a
/// clone to every evaluator it constructs; clones share the underlying
/// map. Rules use it to cache expensive derived values for later rules.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<RwLock<HashMap<String, Value>>>,
}

impl SharedStore {
    pub fn new() -> Self {
        SharedStore::default()
    }

    /// Current value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.read().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().contains_key(key)
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.inner.write().insert(key.into(), value);
    }

    /// Atomic get-or-compute.
    ///
    /// The write lock is held across the presence check and the compute,
    /// so two rules racing on the same key agree on a single value and
    /// only one pays the computation cost.
    pub fn get_or_insert_with(&self, key: &str, compute: impl FnOnce() -> Value) -> Value {
        if let Some(value) = self.inner.read().get(key) {
            return value.clone();
        }
        let mut map = self.inner.write();
        map.entry(key.to_string()).or_insert_with(compute).clone()
    }

    /// True if `other` is a handle to the same underlying map.
    pub fn same_store(&self, other: &SharedStore) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
