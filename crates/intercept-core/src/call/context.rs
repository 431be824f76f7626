//! Per-call context bag.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

/// String-keyed bag shared by every unit taking part in one call.
///
/// Cloning yields another handle to the same bag: a [`CallResult`] carries a
/// handle to the bag its [`CallInvocation`] created, so data left by a unit
/// before the call is visible to units and callers reading the result.
///
/// [`CallResult`]: super::CallResult
/// [`CallInvocation`]: super::CallInvocation
#[derive(Clone, Default)]
pub struct InvocationContext {
    entries: Arc<Mutex<HashMap<String, Value>>>,
}

impl InvocationContext {
    /// Create an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().get(key).cloned()
    }

    /// Store a value, returning the previous one.
    pub fn insert(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.lock().insert(key.into(), value)
    }

    /// Remove and return the value under `key`.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.entries.lock().remove(key)
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the bag is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Sorted list of keys.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Whether both handles refer to the same bag.
    #[must_use]
    pub fn same_as(&self, other: &InvocationContext) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationContext")
            .field("keys", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clones_share_storage() {
        let a = InvocationContext::new();
        let b = a.clone();
        let _ = a.insert("user", json!("alice"));
        assert_eq!(b.get("user"), Some(json!("alice")));
        assert!(a.same_as(&b));
        assert!(!a.same_as(&InvocationContext::new()));
    }

    #[test]
    fn insert_returns_previous() {
        let ctx = InvocationContext::new();
        assert!(ctx.insert("k", json!(1)).is_none());
        assert_eq!(ctx.insert("k", json!(2)), Some(json!(1)));
        assert_eq!(ctx.remove("k"), Some(json!(2)));
        assert!(ctx.is_empty());
    }

    #[test]
    fn keys_are_sorted() {
        let ctx = InvocationContext::new();
        let _ = ctx.insert("b", json!(null));
        let _ = ctx.insert("a", json!(null));
        assert_eq!(ctx.keys(), vec!["a", "b"]);
        assert_eq!(ctx.len(), 2);
    }
}
