//! # GridFS Testkit
//!
//! Test utilities for GridFS.
//!
//! This crate provides:
//! - Fixtures for in-memory grid filesystems with known contents
//! - Property-based test generators using proptest
//! - Cache wrappers that count, record and fail operations on demand
//! - Stress helpers driving many streams concurrently
//!
//! ## Usage
//!
//! ```rust
//! use gridfs_testkit::prelude::*;
//!
//! let grid = TestGrid::with_chunk_size(4);
//! grid.write_file("/f", b"ABCDEFGHI");
//! assert_eq!(grid.read_file("/f"), b"ABCDEFGHI");
//! assert_eq!(grid.counters().puts(), 3);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faults;
pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::faults::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use faults::*;
pub use fixtures::*;
pub use generators::*;
pub use stress::*;
