//! Test fixtures and grid helpers.
//!
//! Provides in-memory grid filesystems wired to instrumented caches, plus
//! shortcuts for writing and reading whole files.

use crate::faults::{CacheCounters, InstrumentedCache, OpLog};
use gridfs_core::{CacheMetadataStore, GridConfig, GridFilesystem, GridInputStream};
use gridfs_storage::Cache;
use std::io::Read;
use std::sync::Arc;

/// An in-memory grid whose caches record every operation.
///
/// The data cache and the metadata cache are separate but share one
/// [`OpLog`], so tests can check the relative order of chunk stores and
/// length updates.
pub struct TestGrid {
    /// The filesystem under test.
    pub fs: GridFilesystem,
    data: Arc<InstrumentedCache>,
    metadata: Arc<InstrumentedCache>,
    log: OpLog,
}

impl TestGrid {
    /// Creates a grid with the default configuration.
    pub fn new() -> Self {
        Self::with_config(GridConfig::default())
    }

    /// Creates a grid whose files default to `chunk_size`.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self::with_config(GridConfig::new().default_chunk_size(chunk_size))
    }

    /// Creates a grid with the given configuration.
    pub fn with_config(config: GridConfig) -> Self {
        let log = OpLog::new();
        let data = Arc::new(InstrumentedCache::with_log(log.clone()));
        let metadata = Arc::new(InstrumentedCache::with_log(log.clone()));
        let store = CacheMetadataStore::new(Arc::clone(&metadata) as Arc<dyn Cache>);
        let fs = GridFilesystem::with_config(
            Arc::clone(&data) as Arc<dyn Cache>,
            Arc::new(store),
            config,
        )
        .expect("Failed to create grid filesystem");
        Self {
            fs,
            data,
            metadata,
            log,
        }
    }

    /// Returns the cache holding chunks.
    pub fn data(&self) -> &InstrumentedCache {
        &self.data
    }

    /// Returns the cache holding metadata records.
    pub fn metadata(&self) -> &InstrumentedCache {
        &self.metadata
    }

    /// Returns the log shared by both caches.
    pub fn log(&self) -> &OpLog {
        &self.log
    }

    /// Returns the data cache's operation tallies.
    pub fn counters(&self) -> &CacheCounters {
        self.data.counters()
    }

    /// Writes `content` to `path`, replacing whatever was there.
    pub fn write_file(&self, path: &str, content: &[u8]) {
        let mut out = self
            .fs
            .open_output(path, false)
            .expect("Failed to open output stream");
        out.write_bytes(content).expect("Failed to write");
        out.close().expect("Failed to close output stream");
    }

    /// Appends `content` to `path`.
    pub fn append_file(&self, path: &str, content: &[u8]) {
        let mut out = self
            .fs
            .open_output(path, true)
            .expect("Failed to open output stream");
        out.write_bytes(content).expect("Failed to append");
        out.close().expect("Failed to close output stream");
    }

    /// Opens a read stream on `path`.
    pub fn open(&self, path: &str) -> GridInputStream {
        self.fs.open_input(path).expect("Failed to open input stream")
    }

    /// Reads all of `path`.
    pub fn read_file(&self, path: &str) -> Vec<u8> {
        let mut out = Vec::new();
        self.open(path)
            .read_to_end(&mut out)
            .expect("Failed to read file");
        out
    }
}

impl Default for TestGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestGrid {
    type Target = GridFilesystem;

    fn deref(&self) -> &Self::Target {
        &self.fs
    }
}

/// Runs a test against a fresh grid whose files default to `chunk_size`.
///
/// # Example
///
/// ```rust
/// use gridfs_testkit::with_temp_grid;
///
/// with_temp_grid(4, |grid| {
///     grid.write_file("/f", b"hello");
///     assert_eq!(grid.fs.length("/f").unwrap(), 5);
/// });
/// ```
pub fn with_temp_grid<F, R>(chunk_size: usize, f: F) -> R
where
    F: FnOnce(&TestGrid) -> R,
{
    let grid = TestGrid::with_chunk_size(chunk_size);
    f(&grid)
}

/// Returns `len` bytes of a repeating, position-dependent pattern.
pub fn patterned_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
