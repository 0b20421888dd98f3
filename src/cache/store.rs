//! Cache Store Module
//!
//! Unbounded memoization store keyed by string, with access counting and
//! explicit invalidation. Nothing is ever evicted implicitly.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, Cached};
use crate::error::Result;

/// Cache store shared between the coalescer, the session and the diagnostics API.
pub type SharedCache = Arc<RwLock<CacheStore>>;

// == Cache Store ==
/// Keyed memoization storage.
#[derive(Debug, Default)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Lookup statistics
    stats: CacheStats,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store ready to be shared across tasks.
    pub fn shared() -> SharedCache {
        Arc::new(RwLock::new(Self::new()))
    }

    // == Set ==
    /// Stores a value, overwriting any previous entry and resetting its counter.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), CacheEntry::new(value));
        self.stats.record_set();
        self.stats.set_total_entries(self.entries.len());
    }

    // == Is Cached ==
    /// Looks up a key, counting the access on a hit.
    ///
    /// Falsy values (`false`, `0`, `""`, `null`) are hits.
    pub fn is_cached(&mut self, key: &str) -> Cached<Value> {
        match self.entries.get_mut(key) {
            Some(entry) => {
                self.stats.record_hit();
                Cached::Present(entry.touch())
            }
            None => {
                self.stats.record_miss();
                Cached::Absent
            }
        }
    }

    // == Peek ==
    /// Looks up a key without touching any counter.
    pub fn peek(&self, key: &str) -> Cached<Value> {
        self.entries.get(key).map(|entry| entry.value.clone()).into()
    }

    /// Returns the full entry, including diagnostics, without counting the access.
    pub fn entry(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Counted lookup decoded into `T`.
    pub fn get_as<T: DeserializeOwned>(&mut self, key: &str) -> Result<Cached<T>> {
        self.is_cached(key).decode()
    }

    // == Clear ==
    /// Removes one entry, or the whole store when `key` is `None`.
    ///
    /// Returns `true` when something was removed; clearing the whole store
    /// always returns `true`.
    pub fn clear(&mut self, key: Option<&str>) -> bool {
        let before = self.entries.len();
        let removed = match key {
            Some(key) => self.entries.remove(key).is_some(),
            None => {
                self.entries = HashMap::new();
                true
            }
        };

        if removed {
            self.stats.record_clear();
        }
        self.stats.set_total_entries(self.entries.len());

        debug!(
            key = key.unwrap_or("*"),
            removed,
            entries_before = before,
            entries_after = self.entries.len(),
            "cache cleared"
        );
        removed
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Returns the stored keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_store_new() {
        let store = CacheStore::new();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_set_and_is_cached() {
        let mut store = CacheStore::new();

        store.set("web_title", json!("Intranet"));
        assert_eq!(store.is_cached("web_title"), Cached::Present(json!("Intranet")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_miss() {
        let mut store = CacheStore::new();
        assert_eq!(store.is_cached("nonexistent"), Cached::Absent);
    }

    #[test]
    fn test_store_falsy_values_hit() {
        let mut store = CacheStore::new();
        store.set("has_unique_perms", json!(false));
        store.set("item_count", json!(0));
        store.set("description", json!(""));

        assert_eq!(store.is_cached("has_unique_perms"), Cached::Present(json!(false)));
        assert_eq!(store.is_cached("item_count"), Cached::Present(json!(0)));
        assert_eq!(store.is_cached("description"), Cached::Present(json!("")));
    }

    #[test]
    fn test_store_access_count() {
        let mut store = CacheStore::new();
        store.set("user", json!({"Id": 7}));

        store.is_cached("user");
        store.is_cached("user");
        store.peek("user");

        assert_eq!(store.entry("user").unwrap().access_count, 2);
    }

    #[test]
    fn test_store_overwrite_resets_counter() {
        let mut store = CacheStore::new();

        store.set("key1", json!("value1"));
        store.is_cached("key1");
        store.set("key1", json!("value2"));

        assert_eq!(store.peek("key1"), Cached::Present(json!("value2")));
        assert_eq!(store.entry("key1").unwrap().access_count, 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_clear_key() {
        let mut store = CacheStore::new();

        store.set("key1", json!(1));
        assert!(store.clear(Some("key1")));
        assert!(!store.clear(Some("key1")));
        assert_eq!(store.is_cached("key1"), Cached::Absent);
    }

    #[test]
    fn test_store_clear_all() {
        let mut store = CacheStore::new();

        store.set("key1", json!(1));
        store.set("key2", json!(false));
        assert!(store.clear(None));
        assert!(store.clear(None));

        assert!(store.is_empty());
        assert_eq!(store.is_cached("key1"), Cached::Absent);
        assert_eq!(store.is_cached("key2"), Cached::Absent);
    }

    #[test]
    fn test_store_stats() {
        let mut store = CacheStore::new();

        store.set("key1", json!("value1"));
        store.is_cached("key1"); // hit
        store.is_cached("nonexistent"); // miss
        store.peek("nonexistent"); // not counted
        store.clear(Some("key1"));

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.sets, 1);
        assert_eq!(stats.clears, 1);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_store_get_as() {
        let mut store = CacheStore::new();
        store.set("ids", json!([1, 2, 3]));

        let ids: Cached<Vec<u32>> = store.get_as("ids").unwrap();
        assert_eq!(ids, Cached::Present(vec![1, 2, 3]));
        assert!(store.get_as::<String>("ids").is_err());
    }

    #[test]
    fn test_store_keys_sorted() {
        let mut store = CacheStore::new();
        store.set("b", json!(1));
        store.set("a", json!(2));

        assert_eq!(store.keys(), vec!["a".to_string(), "b".to_string()]);
    }
}
