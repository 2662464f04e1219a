//! Generic two-level memoization cache.
//!
//! `MemoCache` maps `(namespace, key)` pairs to values with no expiry
//! and no size bound; entries leave the table only through `remove` or
//! `reset`. The store uses it to memoize raw and parsed file bodies so
//! re-ingesting an unchanged file skips the read and the parse.
//!
//! Callers coordinate their own invalidation; the cache itself only
//! guards its table for interior mutability.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Two-level memoization table: namespace → key → value.
///
/// Values are cloned out on `get`, so `V` is usually an `Arc` or a
/// small body struct.
#[derive(Debug, Default)]
pub struct MemoCache<V: Clone> {
    spaces: RwLock<FxHashMap<String, FxHashMap<String, V>>>,
}

impl<V: Clone> MemoCache<V> {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self {
            spaces: RwLock::new(FxHashMap::default()),
        }
    }

    /// Insert or replace the value under `(namespace, key)`.
    pub fn set(&self, namespace: &str, key: &str, value: V) {
        self.spaces
            .write()
            .entry(namespace.to_owned())
            .or_default()
            .insert(key.to_owned(), value);
    }

    /// Look up the value under `(namespace, key)`.
    pub fn get(&self, namespace: &str, key: &str) -> Option<V> {
        self.spaces
            .read()
            .get(namespace)
            .and_then(|space| space.get(key))
            .cloned()
    }

    /// Remove the entry under `(namespace, key)`, if present.
    pub fn remove(&self, namespace: &str, key: &str) {
        if let Some(space) = self.spaces.write().get_mut(namespace) {
            space.remove(key);
        }
    }

    /// Number of entries currently held in `namespace`.
    pub fn count_items(&self, namespace: &str) -> usize {
        self.spaces
            .read()
            .get(namespace)
            .map_or(0, |space| space.len())
    }

    /// Clear the whole namespace.
    pub fn reset(&self, namespace: &str) {
        self.spaces.write().remove(namespace);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let cache: MemoCache<String> = MemoCache::new();
        cache.set("files", "en/a.json", "body".to_string());

        assert_eq!(cache.get("files", "en/a.json").as_deref(), Some("body"));
        assert_eq!(cache.get("files", "en/b.json"), None);
        assert_eq!(cache.get("other", "en/a.json"), None);
    }

    #[test]
    fn test_set_replaces() {
        let cache: MemoCache<u32> = MemoCache::new();
        cache.set("ns", "k", 1);
        cache.set("ns", "k", 2);
        assert_eq!(cache.get("ns", "k"), Some(2));
        assert_eq!(cache.count_items("ns"), 1);
    }

    #[test]
    fn test_remove() {
        let cache: MemoCache<u32> = MemoCache::new();
        cache.set("ns", "k", 1);
        cache.remove("ns", "k");
        assert_eq!(cache.get("ns", "k"), None);
        assert_eq!(cache.count_items("ns"), 0);

        // Removing a missing entry is a no-op
        cache.remove("ns", "k");
        cache.remove("missing", "k");
    }

    #[test]
    fn test_count_items_tracks_set_and_remove() {
        let cache: MemoCache<u32> = MemoCache::new();
        assert_eq!(cache.count_items("ns"), 0);

        cache.set("ns", "a", 1);
        cache.set("ns", "b", 2);
        assert_eq!(cache.count_items("ns"), 2);

        cache.remove("ns", "a");
        assert_eq!(cache.count_items("ns"), 1);
    }

    #[test]
    fn test_reset_isolates_namespaces() {
        let cache: MemoCache<u32> = MemoCache::new();
        cache.set("files", "a", 1);
        cache.set("queries", "a", 2);

        cache.reset("files");

        assert_eq!(cache.count_items("files"), 0);
        assert_eq!(cache.get("queries", "a"), Some(2));
    }
}
