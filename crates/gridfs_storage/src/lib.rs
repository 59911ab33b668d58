//! # GridFS Storage
//!
//! Cache contract and reference cache implementation for GridFS.
//!
//! GridFS stores every chunk of a logical file as one entry in a key/value
//! cache. In production that cache is a distributed, replicated store; this
//! crate only describes the narrow surface the streaming layer needs from it.
//! Caches are **opaque byte stores** - they do not interpret the data they
//! hold.
//!
//! ## Design Principles
//!
//! - Caches are simple keyed byte stores (get, put, remove)
//! - No knowledge of chunk layout, file lengths, or key schemes
//! - Must be `Send + Sync` so many streams can share one cache
//! - Consistency, replication and eviction belong to the implementation
//!
//! ## Available Caches
//!
//! - [`InMemoryCache`] - For testing and single-process grids
//!
//! ## Example
//!
//! ```rust
//! use gridfs_storage::{Cache, InMemoryCache};
//!
//! let cache = InMemoryCache::new();
//! cache.put("/data/file.#0", b"hello world".to_vec()).unwrap();
//! let data = cache.get("/data/file.#0").unwrap();
//! assert_eq!(data.as_deref(), Some(&b"hello world"[..]));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod error;
mod memory;

pub use cache::Cache;
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryCache;
