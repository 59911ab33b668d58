//! Chunk mapper: one cache entry per chunk.
//!
//! ## Key Format
//!
//! ```text
//! {path}.#{chunk index}
//! ```
//!
//! The key scheme is fixed for the lifetime of a file. Changing it would
//! orphan every chunk already stored.

use crate::error::{GridError, GridResult};
use crate::layout::ChunkLayout;
use gridfs_storage::Cache;
use std::sync::Arc;

/// Separator between a file path and a chunk index in cache keys.
pub const CHUNK_KEY_SEPARATOR: &str = ".#";

/// Returns the cache key of chunk `index` of the file at `path`.
#[must_use]
pub fn chunk_key(path: &str, index: u64) -> String {
    format!("{path}{CHUNK_KEY_SEPARATOR}{index}")
}

/// Translates chunk indices of one file into cache operations.
///
/// Every call performs exactly one cache operation. Nothing is cached
/// between calls; streams are responsible for not fetching the same chunk
/// twice.
#[derive(Clone)]
pub struct ChunkMapper {
    path: Arc<str>,
    layout: ChunkLayout,
    cache: Arc<dyn Cache>,
}

impl ChunkMapper {
    /// Creates a mapper for the file at `path`.
    pub fn new(path: impl Into<Arc<str>>, layout: ChunkLayout, cache: Arc<dyn Cache>) -> Self {
        Self {
            path: path.into(),
            layout,
            cache,
        }
    }

    /// Returns the file's path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the file's chunk layout.
    #[must_use]
    pub const fn layout(&self) -> ChunkLayout {
        self.layout
    }

    /// Returns the file's chunk size.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.layout.chunk_size()
    }

    /// Returns the cache key of chunk `index`.
    #[must_use]
    pub fn key(&self, index: u64) -> String {
        chunk_key(&self.path, index)
    }

    /// Fetches chunk `index`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::MissingChunk`] if the cache has no entry for the
    /// chunk, or the cache's own error if it cannot be reached.
    pub fn fetch_chunk(&self, index: u64) -> GridResult<Vec<u8>> {
        let key = self.key(index);
        match self.cache.get(&key)? {
            Some(bytes) => {
                tracing::debug!(%key, len = bytes.len(), "fetched chunk");
                Ok(bytes)
            }
            None => Err(GridError::MissingChunk {
                path: self.path.to_string(),
                index,
            }),
        }
    }

    /// Stores `bytes` as chunk `index`, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns an error if the chunk is larger than the chunk size or the
    /// cache rejects the write.
    pub fn store_chunk(&self, index: u64, bytes: Vec<u8>) -> GridResult<()> {
        if bytes.len() > self.chunk_size() {
            return Err(GridError::invalid_argument(format!(
                "chunk of {} bytes exceeds chunk size {}",
                bytes.len(),
                self.chunk_size()
            )));
        }
        let key = self.key(index);
        tracing::debug!(%key, len = bytes.len(), "storing chunk");
        self.cache.put(&key, bytes)?;
        Ok(())
    }

    /// Removes chunk `index`. Returns `true` if an entry was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be reached.
    pub fn remove_chunk(&self, index: u64) -> GridResult<bool> {
        Ok(self.cache.remove(&self.key(index))?.is_some())
    }
}

impl std::fmt::Debug for ChunkMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkMapper")
            .field("path", &self.path)
            .field("chunk_size", &self.chunk_size())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridfs_storage::InMemoryCache;

    fn mapper(chunk_size: usize) -> (Arc<InMemoryCache>, ChunkMapper) {
        let cache = Arc::new(InMemoryCache::new());
        let mapper = ChunkMapper::new(
            "/dir/file",
            ChunkLayout::new(chunk_size).unwrap(),
            Arc::clone(&cache) as Arc<dyn Cache>,
        );
        (cache, mapper)
    }

    #[test]
    fn key_format() {
        assert_eq!(chunk_key("/dir/file", 0), "/dir/file.#0");
        assert_eq!(chunk_key("/dir/file", 12), "/dir/file.#12");
    }

    #[test]
    fn store_then_fetch() {
        let (cache, mapper) = mapper(4);
        mapper.store_chunk(1, b"EFGH".to_vec()).unwrap();

        assert_eq!(cache.keys(), vec!["/dir/file.#1"]);
        assert_eq!(mapper.fetch_chunk(1).unwrap(), b"EFGH");
    }

    #[test]
    fn store_overwrites() {
        let (_cache, mapper) = mapper(4);
        mapper.store_chunk(0, b"ABCD".to_vec()).unwrap();
        mapper.store_chunk(0, b"xy".to_vec()).unwrap();
        assert_eq!(mapper.fetch_chunk(0).unwrap(), b"xy");
    }

    #[test]
    fn fetch_missing_is_an_error() {
        let (_cache, mapper) = mapper(4);
        let result = mapper.fetch_chunk(2);
        assert!(matches!(
            result,
            Err(GridError::MissingChunk { index: 2, .. })
        ));
    }

    #[test]
    fn fetch_empty_chunk_is_not_missing() {
        let (_cache, mapper) = mapper(4);
        mapper.store_chunk(0, Vec::new()).unwrap();
        assert!(mapper.fetch_chunk(0).unwrap().is_empty());
    }

    #[test]
    fn oversized_chunk_is_rejected() {
        let (cache, mapper) = mapper(4);
        let result = mapper.store_chunk(0, b"ABCDE".to_vec());
        assert!(matches!(result, Err(GridError::InvalidArgument { .. })));
        assert!(cache.is_empty());
    }

    #[test]
    fn remove_chunk() {
        let (_cache, mapper) = mapper(4);
        mapper.store_chunk(0, b"AB".to_vec()).unwrap();
        assert!(mapper.remove_chunk(0).unwrap());
        assert!(!mapper.remove_chunk(0).unwrap());
    }

    #[test]
    fn cache_failure_propagates() {
        let (cache, mapper) = mapper(4);
        cache.close();
        assert!(matches!(mapper.fetch_chunk(0), Err(GridError::Storage(_))));
        assert!(matches!(
            mapper.store_chunk(0, vec![1]),
            Err(GridError::Storage(_))
        ));
    }
}
