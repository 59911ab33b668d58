//! Grid file handles.

use crate::error::{GridError, GridResult};
use crate::layout::ChunkLayout;
use crate::metadata::{FileMetadata, MetadataStore};
use std::fmt;
use std::sync::Arc;

/// A handle naming one grid file.
///
/// The handle is an immutable path plus access to the metadata store. It
/// does not cache anything: every accessor reads the store, so streams call
/// them once at open time and keep the result.
#[derive(Clone)]
pub struct GridFile {
    path: Arc<str>,
    metadata: Arc<dyn MetadataStore>,
}

impl GridFile {
    /// Creates a handle for `path`.
    pub fn new(path: impl Into<Arc<str>>, metadata: Arc<dyn MetadataStore>) -> Self {
        Self {
            path: path.into(),
            metadata,
        }
    }

    /// Returns the file's path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the file's metadata record.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::FileNotFound`] if the file doesn't exist, or a
    /// store error.
    pub fn metadata(&self) -> GridResult<FileMetadata> {
        self.metadata
            .get(&self.path)?
            .ok_or_else(|| GridError::file_not_found(&*self.path))
    }

    /// Returns `true` if metadata exists for this file.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn exists(&self) -> GridResult<bool> {
        Ok(self.metadata.get(&self.path)?.is_some())
    }

    /// Returns the file length in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist or the store fails.
    pub fn length(&self) -> GridResult<u64> {
        Ok(self.metadata()?.length)
    }

    /// Returns the file's fixed chunk size.
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist or the store fails.
    pub fn chunk_size(&self) -> GridResult<usize> {
        Ok(self.metadata()?.chunk_size as usize)
    }

    /// Returns the file's chunk layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist, the store fails, or the
    /// stored chunk size is zero.
    pub fn layout(&self) -> GridResult<ChunkLayout> {
        ChunkLayout::new(self.chunk_size()?)
    }

    /// Records a new file length.
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist or the store fails.
    pub fn set_length(&self, length: u64) -> GridResult<()> {
        let updated = self.metadata()?.with_length(length);
        self.metadata.put(&self.path, &updated)
    }

    /// Creates the file with the given chunk size if it doesn't exist.
    ///
    /// Returns the file's metadata, which keeps its original chunk size if
    /// the file already existed.
    pub(crate) fn create(&self, chunk_size: u32) -> GridResult<FileMetadata> {
        if let Some(existing) = self.metadata.get(&self.path)? {
            return Ok(existing);
        }
        let meta = FileMetadata::new(chunk_size);
        self.metadata.put(&self.path, &meta)?;
        tracing::debug!(path = %self.path, chunk_size, "created grid file");
        Ok(meta)
    }

    pub(crate) fn remove_metadata(&self) -> GridResult<Option<FileMetadata>> {
        self.metadata.remove(&self.path)
    }
}

impl fmt::Debug for GridFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridFile")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for GridFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::CacheMetadataStore;
    use gridfs_storage::InMemoryCache;

    fn file(path: &str) -> GridFile {
        let store = CacheMetadataStore::new(Arc::new(InMemoryCache::new()));
        GridFile::new(path, Arc::new(store))
    }

    #[test]
    fn missing_file() {
        let f = file("/missing");
        assert!(!f.exists().unwrap());
        assert!(matches!(f.length(), Err(GridError::FileNotFound { .. })));
        assert!(matches!(f.set_length(3), Err(GridError::FileNotFound { .. })));
    }

    #[test]
    fn create_and_set_length() {
        let f = file("/a");
        f.create(4).unwrap();

        assert!(f.exists().unwrap());
        assert_eq!(f.length().unwrap(), 0);
        assert_eq!(f.chunk_size().unwrap(), 4);

        f.set_length(9).unwrap();
        assert_eq!(f.length().unwrap(), 9);
        assert_eq!(f.chunk_size().unwrap(), 4);
    }

    #[test]
    fn create_keeps_existing_chunk_size() {
        let f = file("/a");
        f.create(4).unwrap();
        let meta = f.create(1024).unwrap();
        assert_eq!(meta.chunk_size, 4);
        assert_eq!(f.layout().unwrap().chunk_size(), 4);
    }

    #[test]
    fn display_is_path() {
        assert_eq!(file("/x/y").to_string(), "/x/y");
    }
}
