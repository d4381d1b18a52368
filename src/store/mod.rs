//! Backing stores: the key/value property cache behind every configuration
//! instance, and the resource stores configurations load from and persist
//! to.

mod binding;
mod error;
mod resource;

pub use binding::ResourceBinding;
pub use error::StoreError;
pub use resource::{
    FileResourceStore, MemoryResourceStore, ResourceHandle, ResourceStore, ResourceStoreRegistry,
    ResourceUri,
};

use std::collections::BTreeMap;

use dashmap::DashMap;

use crate::value::PropertyValue;

/// Key/value backing store contract (the property cache).
///
/// Implementations must be safe for concurrent reads and writes without
/// external locking; `keys` ordering is not guaranteed.
pub trait PropertyStore: Send + Sync {
    /// The value stored under a key, if any.
    fn get(&self, key: &str) -> Option<PropertyValue>;

    /// Store a value, returning the previous one if the key existed.
    fn put(&self, key: &str, value: PropertyValue) -> Option<PropertyValue>;

    /// Remove a key, returning the removed value if it existed.
    fn remove(&self, key: &str) -> Option<PropertyValue>;

    /// All stored keys, in no particular order.
    fn keys(&self) -> Vec<String>;

    /// Remove every entry.
    fn remove_all(&self);

    /// A point-in-time copy of the whole store, keyed in sorted order.
    fn snapshot(&self) -> BTreeMap<String, PropertyValue>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Concurrent in-memory [`PropertyStore`].
#[derive(Default)]
pub struct MemoryPropertyStore {
    entries: DashMap<String, PropertyValue>,
}

impl MemoryPropertyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PropertyStore for MemoryPropertyStore {
    fn get(&self, key: &str) -> Option<PropertyValue> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn put(&self, key: &str, value: PropertyValue) -> Option<PropertyValue> {
        self.entries.insert(key.to_string(), value)
    }

    fn remove(&self, key: &str) -> Option<PropertyValue> {
        self.entries.remove(key).map(|(_, value)| value)
    }

    fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    fn remove_all(&self) {
        self.entries.clear();
    }

    fn snapshot(&self) -> BTreeMap<String, PropertyValue> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_returns_previous_value() {
        let store = MemoryPropertyStore::new();
        assert_eq!(store.put("//a", PropertyValue::Int(1)), None);
        assert_eq!(
            store.put("//a", PropertyValue::Int(2)),
            Some(PropertyValue::Int(1))
        );
    }

    #[test]
    fn test_remove_returns_removed_value() {
        let store = MemoryPropertyStore::new();
        store.put("//a", PropertyValue::Int(1));
        assert_eq!(store.remove("//a"), Some(PropertyValue::Int(1)));
        assert_eq!(store.remove("//a"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_snapshot_is_a_point_in_time_copy() {
        let store = MemoryPropertyStore::new();
        store.put("//b", PropertyValue::Int(2));
        store.put("//a", PropertyValue::Int(1));
        let snapshot = store.snapshot();
        store.put("//c", PropertyValue::Int(3));
        assert_eq!(snapshot.len(), 2);
        assert_eq!(
            snapshot.keys().collect::<Vec<_>>(),
            vec!["//a", "//b"]
        );
    }

    #[test]
    fn test_remove_all_clears_everything() {
        let store = MemoryPropertyStore::new();
        store.put("//a", PropertyValue::Int(1));
        store.put("//b", PropertyValue::Int(2));
        store.remove_all();
        assert!(store.is_empty());
        assert!(store.keys().is_empty());
    }
}
