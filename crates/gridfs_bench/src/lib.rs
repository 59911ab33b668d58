//! Benchmark utilities.

use gridfs_core::{CacheMetadataStore, GridConfig, GridFilesystem, GridResult};
use gridfs_storage::{Cache, InMemoryCache};
use rand::Rng;
use std::sync::Arc;

/// Generate random file contents of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Create an in-memory grid whose files default to `chunk_size`.
pub fn grid(chunk_size: usize) -> GridResult<GridFilesystem> {
    let metadata = CacheMetadataStore::new(Arc::new(InMemoryCache::new()));
    GridFilesystem::with_config(
        Arc::new(InMemoryCache::new()) as Arc<dyn Cache>,
        Arc::new(metadata),
        GridConfig::new().default_chunk_size(chunk_size),
    )
}

/// Write `data` to `path` in calls of `write_size` bytes.
pub fn write_file(
    fs: &GridFilesystem,
    path: &str,
    data: &[u8],
    write_size: usize,
) -> GridResult<()> {
    let mut out = fs.open_output(path, false)?;
    for piece in data.chunks(write_size.max(1)) {
        out.write_bytes(piece)?;
    }
    out.close()
}
