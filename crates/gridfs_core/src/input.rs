//! Read stream over a chunked grid file.
//!
//! ## Semantics
//!
//! - The file length is read once when the stream opens; later changes to
//!   the file are not visible through an open stream
//! - Chunks are fetched lazily, one cache `get` per chunk boundary crossed
//! - End-of-stream is `Ok(None)`, never an error
//! - A chunk the file length says must exist but the cache doesn't have is
//!   a [`GridError::MissingChunk`]; a chunk shorter than the length implies
//!   is a [`GridError::CorruptChunk`]. Neither is ever papered over with
//!   zeros
//! - Once closed, every operation fails with [`GridError::Closed`]

use crate::chunk::ChunkMapper;
use crate::cursor::{ChunkCursor, StreamState};
use crate::error::{GridError, GridResult};
use crate::file::GridFile;
use crate::layout::ChunkLayout;
use gridfs_storage::Cache;
use std::io::{self, Read};
use std::sync::Arc;

/// A sequential read stream over one grid file.
///
/// # Example
///
/// ```rust
/// use gridfs_core::GridFilesystem;
///
/// let fs = GridFilesystem::in_memory();
/// fs.create_with_chunk_size("/f", 4).unwrap();
/// let mut out = fs.open_output("/f", false).unwrap();
/// out.write_bytes(b"ABCDEFGHI").unwrap();
/// out.close().unwrap();
///
/// let mut input = fs.open_input("/f").unwrap();
/// assert_eq!(input.read_byte().unwrap(), Some(b'A'));
/// assert_eq!(input.skip(6).unwrap(), 6);
/// let mut buf = [0u8; 8];
/// assert_eq!(input.read_bytes(&mut buf).unwrap(), Some(2));
/// assert_eq!(&buf[..2], b"HI");
/// assert_eq!(input.read_byte().unwrap(), None);
/// ```
#[derive(Debug)]
pub struct GridInputStream {
    mapper: ChunkMapper,
    cursor: ChunkCursor,
    len: u64,
    state: StreamState,
}

impl GridInputStream {
    /// Opens a read stream over `file`, reading chunks from `cache`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist or its metadata cannot be
    /// read.
    pub fn open(file: &GridFile, cache: Arc<dyn Cache>) -> GridResult<Self> {
        let meta = file.metadata()?;
        let layout = ChunkLayout::new(meta.chunk_size as usize)?;
        tracing::debug!(
            path = file.path(),
            len = meta.length,
            chunk_size = meta.chunk_size,
            "opened input stream"
        );
        Ok(Self {
            mapper: ChunkMapper::new(file.path(), layout, cache),
            cursor: ChunkCursor::new(layout),
            len: meta.length,
            state: StreamState::Open,
        })
    }

    /// Reads one byte, or returns `None` at end of stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is closed or the chunk cannot be
    /// fetched.
    pub fn read_byte(&mut self) -> GridResult<Option<u8>> {
        self.ensure_open()?;
        if self.is_end_reached() {
            return Ok(None);
        }
        if self.cursor.readable_in_chunk() == 0 {
            self.fetch_current_chunk()?;
        }
        let byte = self.cursor.unread()[0];
        self.cursor.advance(1);
        Ok(Some(byte))
    }

    /// Reads into `buf`, crossing chunk boundaries as needed.
    ///
    /// Returns the number of bytes read. A short count means the end of the
    /// stream was reached; `None` means it was reached before any byte was
    /// read. An empty `buf` reads nothing and returns `Some(0)`.
    ///
    /// If a chunk fetch fails part way, the bytes already copied stay in
    /// `buf` and the stream position reflects them.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is closed or a chunk cannot be
    /// fetched.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> GridResult<Option<usize>> {
        self.ensure_open()?;
        let mut total = 0;
        while total < buf.len() {
            match self.read_from_chunk(&mut buf[total..])? {
                Some(n) => total += n,
                None if total > 0 => return Ok(Some(total)),
                None => return Ok(None),
            }
        }
        Ok(Some(total))
    }

    /// Reads up to `len` bytes into `buf[offset..offset + len]`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidArgument`] if the region doesn't fit in
    /// `buf`, otherwise as [`GridInputStream::read_bytes`].
    pub fn read_region(
        &mut self,
        buf: &mut [u8],
        offset: usize,
        len: usize,
    ) -> GridResult<Option<usize>> {
        let region = region_mut(buf, offset, len)?;
        self.read_bytes(region)
    }

    /// Skips up to `n` bytes and returns how many were skipped.
    ///
    /// A negative or zero `n` skips nothing. Skipping past the end stops at
    /// the end. If the chunk at the new position cannot be fetched, the
    /// position has still moved and the next read retries the fetch.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is closed or the chunk at the new
    /// position cannot be fetched.
    pub fn skip(&mut self, n: i64) -> GridResult<u64> {
        self.ensure_open()?;
        let Ok(requested) = u64::try_from(n) else {
            return Ok(0);
        };
        let to_skip = requested.min(self.remaining());
        if to_skip == 0 {
            return Ok(0);
        }

        if to_skip <= self.cursor.readable_in_chunk() as u64 {
            self.cursor.advance(to_skip as usize);
        } else {
            self.cursor.jump(to_skip);
            // The chunk at the end offset may not exist.
            if !self.is_end_reached() {
                self.fetch_current_chunk()?;
            }
        }
        Ok(to_skip)
    }

    /// Returns the number of bytes left in the currently buffered chunk.
    ///
    /// This is a cheap lower bound that never touches the cache, not the
    /// number of bytes left in the stream. It is 0 before the first read.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is closed.
    pub fn available(&self) -> GridResult<usize> {
        self.ensure_open()?;
        Ok(self.cursor.readable_in_chunk())
    }

    /// Closes the stream. Closing twice is harmless.
    ///
    /// Chunks stay in the cache; only this stream's state is discarded.
    pub fn close(&mut self) {
        if self.state == StreamState::Open {
            tracing::debug!(path = self.mapper.path(), "closed input stream");
        }
        self.cursor.reset();
        self.state = StreamState::Closed;
    }

    /// Returns the current logical offset. 0 once closed.
    #[must_use]
    pub const fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Returns the file length captured when the stream opened.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.len
    }

    /// Returns `true` if the file was empty when the stream opened.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of bytes between the position and the end.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.len - self.cursor.position()
    }

    /// Returns `true` once [`GridInputStream::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state == StreamState::Closed
    }

    /// Returns the file's chunk size.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.mapper.chunk_size()
    }

    /// Returns the file's path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.mapper.path()
    }

    fn ensure_open(&self) -> GridResult<()> {
        match self.state {
            StreamState::Open => Ok(()),
            StreamState::Closed => Err(GridError::Closed),
        }
    }

    fn is_end_reached(&self) -> bool {
        self.cursor.position() == self.len
    }

    fn read_from_chunk(&mut self, out: &mut [u8]) -> GridResult<Option<usize>> {
        if self.is_end_reached() {
            return Ok(None);
        }
        if self.cursor.readable_in_chunk() == 0 {
            self.fetch_current_chunk()?;
        }
        let unread = self.cursor.unread();
        let n = unread.len().min(out.len());
        out[..n].copy_from_slice(&unread[..n]);
        self.cursor.advance(n);
        Ok(Some(n))
    }

    /// Fetches the chunk containing the current position and makes it the
    /// buffer, checking its length against the length snapshot.
    fn fetch_current_chunk(&mut self) -> GridResult<()> {
        let index = self.cursor.chunk_index();
        let expected = self.cursor.layout().chunk_len(index, self.len);
        let mut chunk = self.mapper.fetch_chunk(index)?;
        if chunk.len() < expected {
            return Err(GridError::CorruptChunk {
                path: self.mapper.path().to_owned(),
                index,
                expected,
                actual: chunk.len(),
            });
        }
        chunk.truncate(expected);
        self.cursor.load(chunk);
        Ok(())
    }
}

impl Read for GridInputStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_bytes(buf)?.unwrap_or(0))
    }
}

/// Returns `buf[offset..offset + len]`, or an argument error if it doesn't
/// fit.
pub(crate) fn region_mut(buf: &mut [u8], offset: usize, len: usize) -> GridResult<&mut [u8]> {
    let buf_len = buf.len();
    offset
        .checked_add(len)
        .and_then(|end| buf.get_mut(offset..end))
        .ok_or_else(|| out_of_bounds(offset, len, buf_len))
}

/// Shared-slice counterpart of [`region_mut`].
pub(crate) fn region(buf: &[u8], offset: usize, len: usize) -> GridResult<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| buf.get(offset..end))
        .ok_or_else(|| out_of_bounds(offset, len, buf.len()))
}

fn out_of_bounds(offset: usize, len: usize, buf_len: usize) -> GridError {
    GridError::invalid_argument(format!(
        "region {offset}+{len} out of bounds for buffer of {buf_len} bytes"
    ))
}
