//! Roundtrip command implementation.
//!
//! Streams a local file into an in-memory grid, streams it back out and
//! compares the two byte for byte.

use gridfs_core::{CacheMetadataStore, GridConfig, GridFilesystem};
use gridfs_storage::InMemoryCache;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

const GRID_PATH: &str = "/roundtrip";
const COMPARE_BUFFER: usize = 64 * 1024;

/// Ways a round trip can fail verification.
#[derive(Debug, Error)]
pub enum RoundTripError {
    /// Write size of zero.
    #[error("write size must be greater than zero")]
    ZeroWriteSize,

    /// The grid reported a different length than was written.
    #[error("grid length {actual} does not match source length {expected}")]
    LengthMismatch {
        /// Bytes in the source file.
        expected: u64,
        /// Length the grid reported.
        actual: u64,
    },

    /// The bytes read back differ from the source.
    #[error("content differs at offset {offset}")]
    Mismatch {
        /// First differing offset.
        offset: u64,
    },
}

/// Outcome of a successful round trip.
#[derive(Debug)]
pub struct RoundTripReport {
    /// Bytes streamed through the grid.
    pub bytes: u64,
    /// Chunk size used.
    pub chunk_size: usize,
    /// Chunk entries left in the data cache.
    pub chunks: usize,
}

/// Streams `input` through a fresh in-memory grid and verifies it.
///
/// When `output` is given, the bytes read back from the grid are written
/// there as well.
pub fn round_trip(
    input: &Path,
    chunk_size: usize,
    write_size: usize,
    output: Option<&Path>,
) -> Result<RoundTripReport, Box<dyn std::error::Error>> {
    if write_size == 0 {
        return Err(RoundTripError::ZeroWriteSize.into());
    }

    let data = Arc::new(InMemoryCache::new());
    let metadata = CacheMetadataStore::new(Arc::new(InMemoryCache::new()));
    let fs = GridFilesystem::with_config(
        Arc::clone(&data) as Arc<dyn gridfs_storage::Cache>,
        Arc::new(metadata),
        GridConfig::new().default_chunk_size(chunk_size),
    )?;

    // Write
    let mut source = File::open(input)?;
    let mut out = fs.open_output(GRID_PATH, false)?;
    let mut buf = vec![0u8; write_size];
    let mut written = 0u64;
    loop {
        let n = source.read(&mut buf)?;
        if n == 0 {
            break;
        }
        out.write_bytes(&buf[..n])?;
        written += n as u64;
    }
    out.close()?;
    tracing::debug!(bytes = written, chunks = data.len(), "wrote source into grid");

    let length = fs.length(GRID_PATH)?;
    if length != written {
        return Err(RoundTripError::LengthMismatch {
            expected: written,
            actual: length,
        }
        .into());
    }

    // Copy out
    if let Some(output) = output {
        let mut sink = File::create(output)?;
        io::copy(&mut fs.open_input(GRID_PATH)?, &mut sink)?;
        sink.flush()?;
    }

    // Verify
    let source = BufReader::new(File::open(input)?);
    if let Some(offset) = first_difference(source, fs.open_input(GRID_PATH)?)? {
        return Err(RoundTripError::Mismatch { offset }.into());
    }

    Ok(RoundTripReport {
        bytes: written,
        chunk_size,
        chunks: data.len(),
    })
}

/// Runs the roundtrip command.
pub fn run(
    input: &Path,
    chunk_size: usize,
    write_size: usize,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Streaming {:?} through an in-memory grid", input);

    let report = round_trip(input, chunk_size, write_size, output)?;

    println!("Bytes: {}", report.bytes);
    println!("Chunk size: {} bytes", report.chunk_size);
    println!("Chunks stored: {}", report.chunks);
    if let Some(output) = output {
        println!("Read-back copy written to {:?}", output);
    }
    println!();
    println!("✓ Round trip verified");
    Ok(())
}

/// Returns the first offset at which `a` and `b` differ, including one
/// ending before the other.
fn first_difference(mut a: impl Read, mut b: impl Read) -> io::Result<Option<u64>> {
    let mut left = vec![0u8; COMPARE_BUFFER];
    let mut right = vec![0u8; COMPARE_BUFFER];
    let mut offset = 0u64;
    loop {
        let n = fill(&mut a, &mut left)?;
        let m = fill(&mut b, &mut right)?;
        let common = n.min(m);
        if let Some(i) = left[..common]
            .iter()
            .zip(&right[..common])
            .position(|(x, y)| x != y)
        {
            return Ok(Some(offset + i as u64));
        }
        if n != m {
            return Ok(Some(offset + common as u64));
        }
        if n == 0 {
            return Ok(None);
        }
        offset += n as u64;
    }
}

/// Reads until `buf` is full or the reader is exhausted.
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
