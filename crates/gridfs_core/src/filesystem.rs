//! Grid filesystem facade.

use crate::chunk::ChunkMapper;
use crate::config::{validate_chunk_size, GridConfig};
use crate::error::GridResult;
use crate::file::GridFile;
use crate::input::GridInputStream;
use crate::metadata::{CacheMetadataStore, FileMetadata, MetadataStore};
use crate::output::GridOutputStream;
use gridfs_storage::{Cache, InMemoryCache};
use std::sync::Arc;

/// Binds a data cache, a metadata store and a configuration, and hands out
/// file handles and streams.
///
/// Cloning is cheap; clones share the same caches.
#[derive(Clone)]
pub struct GridFilesystem {
    data: Arc<dyn Cache>,
    metadata: Arc<dyn MetadataStore>,
    config: GridConfig,
}

impl GridFilesystem {
    /// Creates a filesystem with the default configuration.
    pub fn new(data: Arc<dyn Cache>, metadata: Arc<dyn MetadataStore>) -> Self {
        Self {
            data,
            metadata,
            config: GridConfig::default(),
        }
    }

    /// Creates a filesystem with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_config(
        data: Arc<dyn Cache>,
        metadata: Arc<dyn MetadataStore>,
        config: GridConfig,
    ) -> GridResult<Self> {
        config.validate()?;
        Ok(Self {
            data,
            metadata,
            config,
        })
    }

    /// Creates a filesystem over two fresh in-memory caches, one for chunks
    /// and one for metadata.
    #[must_use]
    pub fn in_memory() -> Self {
        let metadata = CacheMetadataStore::new(Arc::new(InMemoryCache::new()));
        Self::new(Arc::new(InMemoryCache::new()), Arc::new(metadata))
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Returns the cache holding chunk data.
    #[must_use]
    pub fn data_cache(&self) -> &Arc<dyn Cache> {
        &self.data
    }

    /// Returns a handle for `path`. The file need not exist.
    #[must_use]
    pub fn file(&self, path: &str) -> GridFile {
        GridFile::new(path, Arc::clone(&self.metadata))
    }

    /// Creates an empty file with the default chunk size, unless it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata store fails.
    pub fn create(&self, path: &str) -> GridResult<FileMetadata> {
        self.create_with_chunk_size(path, self.config.default_chunk_size)
    }

    /// Creates an empty file with the given chunk size, unless it exists.
    /// An existing file keeps its original chunk size.
    ///
    /// # Errors
    ///
    /// Returns an error if `chunk_size` is invalid or the store fails.
    pub fn create_with_chunk_size(&self, path: &str, chunk_size: usize) -> GridResult<FileMetadata> {
        validate_chunk_size(chunk_size)?;
        // validated above to fit in u32
        self.file(path).create(chunk_size as u32)
    }

    /// Returns `true` if the file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata store fails.
    pub fn exists(&self, path: &str) -> GridResult<bool> {
        self.file(path).exists()
    }

    /// Returns the file's length.
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist or the store fails.
    pub fn length(&self, path: &str) -> GridResult<u64> {
        self.file(path).length()
    }

    /// Opens a read stream over an existing file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GridError::FileNotFound`] if the file doesn't exist.
    pub fn open_input(&self, path: &str) -> GridResult<GridInputStream> {
        GridInputStream::open(&self.file(path), Arc::clone(&self.data))
    }

    /// Opens a write stream, creating the file with the default chunk size
    /// if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or, in append mode,
    /// its last partial chunk cannot be fetched.
    pub fn open_output(&self, path: &str, append: bool) -> GridResult<GridOutputStream> {
        self.open_output_with_chunk_size(path, append, self.config.default_chunk_size)
    }

    /// Opens a write stream, creating the file with `chunk_size` if needed.
    /// An existing file keeps its original chunk size.
    ///
    /// # Errors
    ///
    /// As [`GridFilesystem::open_output`], plus invalid chunk sizes.
    pub fn open_output_with_chunk_size(
        &self,
        path: &str,
        append: bool,
        chunk_size: usize,
    ) -> GridResult<GridOutputStream> {
        self.create_with_chunk_size(path, chunk_size)?;
        let stream = GridOutputStream::open(&self.file(path), Arc::clone(&self.data), append)?;
        Ok(stream.publish_length_on_flush(self.config.publish_length_on_flush))
    }

    /// Removes a file: every chunk its length implies, then its metadata.
    /// Returns `false` if the file didn't exist.
    ///
    /// Streams already open on the file are not affected until they next
    /// touch a removed chunk.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache or the store fails.
    pub fn remove(&self, path: &str) -> GridResult<bool> {
        let file = self.file(path);
        let Some(meta) = self.metadata.get(path)? else {
            return Ok(false);
        };
        let layout = file.layout()?;
        let mapper = ChunkMapper::new(path, layout, Arc::clone(&self.data));
        // An empty file still owns chunk 0.
        let count = layout.chunk_count(meta.length).max(1);
        for index in 0..count {
            mapper.remove_chunk(index)?;
        }
        file.remove_metadata()?;
        tracing::debug!(path, chunks = count, "removed grid file");
        Ok(true)
    }
}

impl std::fmt::Debug for GridFilesystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridFilesystem")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
