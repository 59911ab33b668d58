//! File metadata records and the store that holds them.
//!
//! The streaming layer only needs a file's length and chunk size. The
//! [`MetadataStore`] trait is that narrow surface; [`CacheMetadataStore`]
//! keeps the records as CBOR values in any [`Cache`].

use crate::error::{GridError, GridResult};
use gridfs_storage::Cache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Metadata kept for every grid file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Logical length in bytes.
    pub length: u64,
    /// Fixed chunk size in bytes.
    pub chunk_size: u32,
    /// Last modification, in milliseconds since the UNIX epoch.
    pub modification_time: u64,
}

impl FileMetadata {
    /// Creates metadata for a new, empty file.
    #[must_use]
    pub fn new(chunk_size: u32) -> Self {
        Self {
            length: 0,
            chunk_size,
            modification_time: now_millis(),
        }
    }

    /// Returns a copy with a new length and a fresh modification time.
    #[must_use]
    pub fn with_length(self, length: u64) -> Self {
        Self {
            length,
            modification_time: now_millis(),
            ..self
        }
    }

    /// Encodes the record as CBOR.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn encode(&self) -> GridResult<Vec<u8>> {
        let mut out = Vec::new();
        ciborium::into_writer(self, &mut out).map_err(|e| GridError::codec(e.to_string()))?;
        Ok(out)
    }

    /// Decodes a record produced by [`FileMetadata::encode`].
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid record.
    pub fn decode(bytes: &[u8]) -> GridResult<Self> {
        ciborium::from_reader(bytes).map_err(|e| GridError::codec(e.to_string()))
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Source of file lengths and chunk sizes.
///
/// Implementations must be `Send + Sync`; one store is shared by every
/// stream of a filesystem.
pub trait MetadataStore: Send + Sync {
    /// Returns the metadata for `path`, or `None` if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn get(&self, path: &str) -> GridResult<Option<FileMetadata>>;

    /// Stores the metadata for `path`, replacing any previous record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn put(&self, path: &str, metadata: &FileMetadata) -> GridResult<()>;

    /// Removes the metadata for `path` and returns it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn remove(&self, path: &str) -> GridResult<Option<FileMetadata>>;
}

/// A [`MetadataStore`] that keeps CBOR-encoded records in a [`Cache`],
/// keyed by path.
pub struct CacheMetadataStore {
    cache: Arc<dyn Cache>,
}

impl CacheMetadataStore {
    /// Creates a store over the given cache.
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self { cache }
    }
}

impl MetadataStore for CacheMetadataStore {
    fn get(&self, path: &str) -> GridResult<Option<FileMetadata>> {
        self.cache
            .get(path)?
            .map(|bytes| FileMetadata::decode(&bytes))
            .transpose()
    }

    fn put(&self, path: &str, metadata: &FileMetadata) -> GridResult<()> {
        self.cache.put(path, metadata.encode()?)?;
        Ok(())
    }

    fn remove(&self, path: &str) -> GridResult<Option<FileMetadata>> {
        self.cache
            .remove(path)?
            .map(|bytes| FileMetadata::decode(&bytes))
            .transpose()
    }
}

impl std::fmt::Debug for CacheMetadataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheMetadataStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridfs_storage::InMemoryCache;

    fn store() -> (Arc<InMemoryCache>, CacheMetadataStore) {
        let cache = Arc::new(InMemoryCache::new());
        let store = CacheMetadataStore::new(Arc::clone(&cache) as Arc<dyn Cache>);
        (cache, store)
    }

    #[test]
    fn new_metadata_is_empty() {
        let meta = FileMetadata::new(4);
        assert_eq!(meta.length, 0);
        assert_eq!(meta.chunk_size, 4);
    }

    #[test]
    fn with_length_keeps_chunk_size() {
        let meta = FileMetadata::new(16).with_length(100);
        assert_eq!(meta.length, 100);
        assert_eq!(meta.chunk_size, 16);
    }

    #[test]
    fn encode_decode() {
        let meta = FileMetadata {
            length: 9,
            chunk_size: 4,
            modification_time: 1_700_000_000_000,
        };
        let decoded = FileMetadata::decode(&meta.encode().unwrap()).unwrap();
        assert_eq!(decoded, meta);
    }

    #[test]
    fn decode_garbage_fails() {
        let result = FileMetadata::decode(&[0xff, 0x00, 0x13]);
        assert!(matches!(result, Err(GridError::Codec { .. })));
    }

    #[test]
    fn store_put_get_remove() {
        let (cache, store) = store();
        let meta = FileMetadata::new(4).with_length(9);

        assert!(store.get("/f").unwrap().is_none());
        store.put("/f", &meta).unwrap();
        assert_eq!(cache.keys(), vec!["/f"]);
        assert_eq!(store.get("/f").unwrap(), Some(meta));

        assert_eq!(store.remove("/f").unwrap(), Some(meta));
        assert!(store.get("/f").unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn store_surfaces_cache_failures() {
        let (cache, store) = store();
        cache.close();
        assert!(matches!(store.get("/f"), Err(GridError::Storage(_))));
    }
}
