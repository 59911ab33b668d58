//! Cache trait definition.

use crate::error::StorageResult;

/// A keyed byte cache used by GridFS.
///
/// Caches are **opaque byte stores**. GridFS owns the key scheme and the
/// meaning of every value; a cache only stores and returns bytes.
///
/// # Invariants
///
/// - `get` returns exactly the bytes of the last successful `put` for a key
///   as far as the cache's own consistency model allows
/// - `put` overwrites any previous value for the key
/// - `remove` returns the value that was removed, if any
/// - Caches must be `Send + Sync`; all methods take `&self` and the
///   implementation provides its own synchronization
///
/// # Implementors
///
/// - [`super::InMemoryCache`] - For testing
pub trait Cache: Send + Sync {
    /// Returns the value stored under `key`, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be reached.
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be reached or rejects the write.
    fn put(&self, key: &str, value: Vec<u8>) -> StorageResult<()>;

    /// Removes the value stored under `key` and returns it.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be reached.
    fn remove(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Returns `true` if a value is stored under `key`.
    ///
    /// The default implementation fetches the value; implementations
    /// should override it when a cheaper check exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be reached.
    fn contains_key(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
