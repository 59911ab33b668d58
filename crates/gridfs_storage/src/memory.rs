//! In-memory cache for testing.

use crate::cache::Cache;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory cache.
///
/// This cache keeps all entries in a process-local map and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Single-process grids that don't need replication
///
/// # Thread Safety
///
/// This cache is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use gridfs_storage::{Cache, InMemoryCache};
///
/// let cache = InMemoryCache::new();
/// cache.put("key", b"test data".to_vec()).unwrap();
/// assert_eq!(cache.len(), 1);
/// assert!(cache.contains_key("key").unwrap());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, Vec<u8>>>,
    closed: RwLock<bool>,
}

impl InMemoryCache {
    /// Creates a new empty in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries in the cache.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns all keys currently stored, sorted.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Removes all entries from the cache.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Shuts the cache down; every later operation fails with
    /// [`StorageError::Closed`].
    pub fn close(&self) {
        *self.closed.write() = true;
        tracing::debug!("in-memory cache closed");
    }

    fn check_open(&self) -> StorageResult<()> {
        if *self.closed.read() {
            return Err(StorageError::Closed);
        }
        Ok(())
    }
}

impl Cache for InMemoryCache {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.check_open()?;
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: Vec<u8>) -> StorageResult<()> {
        self.check_open()?;
        self.entries.write().insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.check_open()?;
        Ok(self.entries.write().remove(key))
    }

    fn contains_key(&self, key: &str) -> StorageResult<bool> {
        self.check_open()?;
        Ok(self.entries.read().contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn memory_new_is_empty() {
        let cache = InMemoryCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
        assert!(cache.keys().is_empty());
    }

    #[test]
    fn memory_get_missing_returns_none() {
        let cache = InMemoryCache::new();
        assert!(cache.get("absent").unwrap().is_none());
        assert!(!cache.contains_key("absent").unwrap());
    }

    #[test]
    fn memory_put_then_get() {
        let cache = InMemoryCache::new();
        cache.put("a", b"hello".to_vec()).unwrap();

        assert_eq!(cache.get("a").unwrap(), Some(b"hello".to_vec()));
        assert!(cache.contains_key("a").unwrap());
    }

    #[test]
    fn memory_put_overwrites() {
        let cache = InMemoryCache::new();
        cache.put("a", b"first".to_vec()).unwrap();
        cache.put("a", b"second".to_vec()).unwrap();

        assert_eq!(cache.get("a").unwrap(), Some(b"second".to_vec()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn memory_remove_returns_value() {
        let cache = InMemoryCache::new();
        cache.put("a", b"data".to_vec()).unwrap();

        assert_eq!(cache.remove("a").unwrap(), Some(b"data".to_vec()));
        assert_eq!(cache.remove("a").unwrap(), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn memory_empty_value_is_stored() {
        let cache = InMemoryCache::new();
        cache.put("empty", Vec::new()).unwrap();

        assert_eq!(cache.get("empty").unwrap(), Some(Vec::new()));
        assert!(cache.contains_key("empty").unwrap());
    }

    #[test]
    fn memory_keys_are_sorted() {
        let cache = InMemoryCache::new();
        cache.put("b", vec![]).unwrap();
        cache.put("a", vec![]).unwrap();
        cache.put("c", vec![]).unwrap();

        assert_eq!(cache.keys(), vec!["a", "b", "c"]);
    }

    #[test]
    fn memory_clear() {
        let cache = InMemoryCache::new();
        cache.put("a", b"some data".to_vec()).unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn memory_closed_rejects_operations() {
        let cache = InMemoryCache::new();
        cache.put("a", vec![1]).unwrap();
        cache.close();

        assert!(matches!(cache.get("a"), Err(StorageError::Closed)));
        assert!(matches!(cache.put("a", vec![2]), Err(StorageError::Closed)));
        assert!(matches!(cache.remove("a"), Err(StorageError::Closed)));
        assert!(matches!(cache.contains_key("a"), Err(StorageError::Closed)));
    }

    #[test]
    fn memory_shared_across_threads() {
        let cache = std::sync::Arc::new(InMemoryCache::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let cache = std::sync::Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache.put(&format!("k{i}"), vec![i as u8]).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 4);
        assert_eq!(cache.get("k2").unwrap(), Some(vec![2]));
    }

    proptest! {
        #[test]
        fn memory_last_put_wins(values in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 1..8)) {
            let cache = InMemoryCache::new();
            for value in &values {
                cache.put("key", value.clone()).unwrap();
            }
            prop_assert_eq!(cache.get("key").unwrap(), values.last().cloned());
        }
    }
}
