//! Error types for GridFS core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type GridResult<T> = Result<T, GridError>;

/// Errors that can occur in GridFS streams and file operations.
#[derive(Debug, Error)]
pub enum GridError {
    /// Cache error.
    #[error("storage error: {0}")]
    Storage(#[from] gridfs_storage::StorageError),

    /// A write failed after some of its bytes were accepted.
    #[error("write failed after {written} bytes: {source}")]
    PartialWrite {
        /// Bytes accepted before the failure.
        written: usize,
        /// The failure that stopped the write.
        source: Box<GridError>,
    },

    /// The stream has been closed.
    #[error("stream is closed")]
    Closed,

    /// No metadata exists for the file.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path of the file.
        path: String,
    },

    /// A chunk implied by the file length is absent from the cache.
    #[error("missing chunk {index} of {path}")]
    MissingChunk {
        /// Path of the file.
        path: String,
        /// Index of the missing chunk.
        index: u64,
    },

    /// A chunk is shorter than the file length requires.
    #[error("chunk {index} of {path} is corrupt: expected {expected} bytes, got {actual}")]
    CorruptChunk {
        /// Path of the file.
        path: String,
        /// Index of the chunk.
        index: u64,
        /// Length the file metadata implies.
        expected: usize,
        /// Length actually stored.
        actual: usize,
    },

    /// A caller passed an out-of-range or otherwise invalid argument.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },

    /// File metadata could not be encoded or decoded.
    #[error("codec error: {message}")]
    Codec {
        /// Description of the failure.
        message: String,
    },
}

impl GridError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /// Returns `true` if this error reports use of a closed stream.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    fn io_kind(&self) -> io::ErrorKind {
        match self {
            Self::PartialWrite { source, .. } => source.io_kind(),
            Self::FileNotFound { .. } => io::ErrorKind::NotFound,
            Self::MissingChunk { .. } | Self::CorruptChunk { .. } => io::ErrorKind::InvalidData,
            Self::InvalidArgument { .. } => io::ErrorKind::InvalidInput,
            _ => io::ErrorKind::Other,
        }
    }
}

impl From<GridError> for io::Error {
    fn from(err: GridError) -> Self {
        io::Error::new(err.io_kind(), err)
    }
}
