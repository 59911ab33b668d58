//! # GridFS Core
//!
//! File streams over a key/value cache.
//!
//! A grid file is split into fixed-size chunks and every chunk is stored as
//! one cache entry. This crate provides:
//! - [`ChunkLayout`] offset arithmetic (chunk index, offset in chunk)
//! - [`ChunkMapper`] for per-chunk cache access
//! - [`GridInputStream`] and [`GridOutputStream`] with byte-exact local
//!   file semantics, implementing `std::io::Read` and `std::io::Write`
//! - [`GridFile`] and [`MetadataStore`] for file lengths and chunk sizes
//! - [`GridFilesystem`] to tie a data cache and a metadata store together
//!
//! ## Example
//!
//! ```rust
//! use gridfs_core::GridFilesystem;
//! use std::io::{Read, Write};
//!
//! let fs = GridFilesystem::in_memory();
//! let mut out = fs.open_output_with_chunk_size("/logs/app.log", false, 4).unwrap();
//! out.write_all(b"hello grid").unwrap();
//! out.close().unwrap();
//!
//! let mut text = String::new();
//! fs.open_input("/logs/app.log").unwrap().read_to_string(&mut text).unwrap();
//! assert_eq!(text, "hello grid");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod chunk;
mod config;
mod cursor;
mod error;
mod file;
mod filesystem;
mod input;
mod layout;
mod metadata;
mod output;

pub use chunk::{chunk_key, ChunkMapper, CHUNK_KEY_SEPARATOR};
pub use config::{GridConfig, DEFAULT_CHUNK_SIZE};
pub use error::{GridError, GridResult};
pub use file::GridFile;
pub use filesystem::GridFilesystem;
pub use input::GridInputStream;
pub use layout::{ChunkLayout, ChunkSpan};
pub use metadata::{CacheMetadataStore, FileMetadata, MetadataStore};
pub use output::GridOutputStream;

/// GridFS core version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
