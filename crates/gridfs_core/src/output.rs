//! Write stream over a chunked grid file.
//!
//! ## Flush Discipline
//!
//! - Bytes accumulate in an owned buffer for the current chunk
//! - When the buffer reaches the chunk size it is stored and a new buffer
//!   starts at the next chunk index
//! - `flush` stores the partial buffer, then publishes the length
//! - `close` stores the final partial buffer, then publishes the length
//! - An overwriting `close` removes chunks left past the new length
//!
//! The chunk is always stored before the length is updated, so a reader
//! that sees the new length also finds every chunk it implies.
//!
//! A failed store never loses accepted bytes: the full buffer stays in
//! place and the next write, flush or close stores it again.

use crate::chunk::ChunkMapper;
use crate::cursor::{ChunkCursor, StreamState};
use crate::error::{GridError, GridResult};
use crate::file::GridFile;
use crate::input::region;
use crate::layout::ChunkLayout;
use gridfs_storage::Cache;
use std::io::{self, Write};
use std::sync::Arc;

/// A sequential write stream over one grid file.
///
/// Dropping an open stream closes it; failures during that implicit close
/// can only be logged, so call [`GridOutputStream::close`] to observe them.
#[derive(Debug)]
pub struct GridOutputStream {
    file: GridFile,
    mapper: ChunkMapper,
    cursor: ChunkCursor,
    publish_length_on_flush: bool,
    /// Length of the file being overwritten; its chunks past the new
    /// length are removed on close.
    replaced_len: u64,
    state: StreamState,
}

impl GridOutputStream {
    /// Opens a write stream over an existing `file`, storing chunks in
    /// `cache`.
    ///
    /// With `append` the stream starts at the current end of the file and
    /// continues its last chunk in place; otherwise it starts at offset 0
    /// and the file's length becomes whatever is written. Chunks of the old
    /// content beyond the new length are removed when the stream closes.
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist, its metadata cannot be
    /// read, or (in append mode) its last partial chunk cannot be fetched.
    pub fn open(file: &GridFile, cache: Arc<dyn Cache>, append: bool) -> GridResult<Self> {
        let meta = file.metadata()?;
        let layout = ChunkLayout::new(meta.chunk_size as usize)?;
        let mapper = ChunkMapper::new(file.path(), layout, cache);

        let cursor = if append {
            let tail = Self::fetch_tail(&mapper, meta.length)?;
            ChunkCursor::for_append(layout, meta.length, tail)
        } else {
            ChunkCursor::new(layout)
        };
        tracing::debug!(
            path = file.path(),
            append,
            position = cursor.position(),
            chunk_size = meta.chunk_size,
            "opened output stream"
        );

        Ok(Self {
            file: file.clone(),
            mapper,
            cursor,
            publish_length_on_flush: true,
            replaced_len: if append { 0 } else { meta.length },
            state: StreamState::Open,
        })
    }

    /// Sets whether [`GridOutputStream::flush`] publishes the file length.
    #[must_use]
    pub fn publish_length_on_flush(mut self, value: bool) -> Self {
        self.publish_length_on_flush = value;
        self
    }

    /// Returns the leading bytes of the chunk an append at `length` lands
    /// in; empty when `length` is on a chunk boundary.
    fn fetch_tail(mapper: &ChunkMapper, length: u64) -> GridResult<Vec<u8>> {
        let layout = mapper.layout();
        let keep = layout.offset_in_chunk(length);
        if keep == 0 {
            return Ok(Vec::with_capacity(layout.chunk_size()));
        }
        let index = layout.chunk_index_of(length);
        let mut chunk = mapper.fetch_chunk(index)?;
        if chunk.len() < keep {
            return Err(GridError::CorruptChunk {
                path: mapper.path().to_owned(),
                index,
                expected: keep,
                actual: chunk.len(),
            });
        }
        chunk.truncate(keep);
        chunk.reserve(layout.chunk_size() - keep);
        Ok(chunk)
    }

    /// Writes one byte.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is closed or a full chunk cannot be
    /// stored.
    pub fn write_byte(&mut self, byte: u8) -> GridResult<()> {
        self.write_bytes(&[byte])
    }

    /// Writes all of `bytes`, storing every chunk that fills up.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is closed or a chunk cannot be stored.
    /// When the failure comes after some bytes were accepted, the error is
    /// [`GridError::PartialWrite`] carrying that count; those bytes are
    /// buffered and only `&bytes[written..]` should be retried.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> GridResult<()> {
        self.ensure_open()?;
        let mut written = 0;
        while written < bytes.len() {
            match self.write_some(&bytes[written..]) {
                Ok(n) => written += n,
                Err(err) if written == 0 => return Err(err),
                Err(err) => {
                    return Err(GridError::PartialWrite {
                        written,
                        source: Box::new(err),
                    })
                }
            }
        }
        Ok(())
    }

    /// Writes `buf[offset..offset + len]`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidArgument`] if the region doesn't fit in
    /// `buf`, otherwise as [`GridOutputStream::write_bytes`].
    pub fn write_region(&mut self, buf: &[u8], offset: usize, len: usize) -> GridResult<()> {
        self.write_bytes(region(buf, offset, len)?)
    }

    /// Stores the partial chunk and, unless disabled, publishes the length
    /// written so far.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is closed or the cache rejects the
    /// chunk or the metadata update.
    pub fn flush(&mut self) -> GridResult<()> {
        self.ensure_open()?;
        if !self.cursor.buffered().is_empty() {
            self.store_buffered_chunk()?;
        }
        if self.publish_length_on_flush {
            self.file.set_length(self.cursor.position())?;
        }
        Ok(())
    }

    /// Stores the final chunk, publishes the file length and closes the
    /// stream. Closing twice is harmless.
    ///
    /// A file that was never written gets an empty chunk 0. If storing or
    /// publishing fails the stream stays open so `close` can be retried.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache rejects the chunk or the metadata
    /// update.
    pub fn close(&mut self) -> GridResult<()> {
        if self.state == StreamState::Closed {
            return Ok(());
        }
        let length = self.cursor.position();
        if !self.cursor.buffered().is_empty() || length == 0 {
            self.store_buffered_chunk()?;
        }
        self.file.set_length(length)?;
        self.remove_replaced_chunks(length)?;

        tracing::debug!(path = self.mapper.path(), length, "closed output stream");
        self.cursor.reset();
        self.state = StreamState::Closed;
        Ok(())
    }

    /// Returns the number of bytes from the start of the file to the
    /// position. 0 once closed.
    #[must_use]
    pub const fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Returns `true` once [`GridOutputStream::close`] has succeeded.
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

    fn store_buffered_chunk(&mut self) -> GridResult<()> {
        let index = self.cursor.buffered_chunk_index();
        self.mapper
            .store_chunk(index, self.cursor.buffered().to_vec())
    }

    fn store_full_chunk(&mut self) -> GridResult<()> {
        self.store_buffered_chunk()?;
        self.cursor.start_next_chunk();
        Ok(())
    }

    /// Accepts a prefix of `bytes` and returns its length.
    ///
    /// Fails only when nothing was accepted. A store failure after some
    /// bytes went in ends the call early with the count so far; a failure
    /// storing the chunk the call just filled is left for the next call.
    fn write_some(&mut self, bytes: &[u8]) -> GridResult<usize> {
        self.ensure_open()?;
        let mut accepted = 0;
        while accepted < bytes.len() {
            if self.cursor.writable_in_chunk() == 0 {
                if let Err(err) = self.store_full_chunk() {
                    if accepted == 0 {
                        return Err(err);
                    }
                    tracing::debug!(
                        path = self.mapper.path(),
                        accepted,
                        error = %err,
                        "chunk store failed mid-write"
                    );
                    return Ok(accepted);
                }
            }
            let n = self.cursor.writable_in_chunk().min(bytes.len() - accepted);
            self.cursor.append(&bytes[accepted..accepted + n]);
            accepted += n;
        }
        if self.cursor.writable_in_chunk() == 0 {
            if let Err(err) = self.store_full_chunk() {
                tracing::debug!(
                    path = self.mapper.path(),
                    error = %err,
                    "deferred store of full chunk"
                );
            }
        }
        Ok(accepted)
    }

    /// Removes chunks of the overwritten content that lie past `length`.
    fn remove_replaced_chunks(&mut self, length: u64) -> GridResult<()> {
        let layout = self.mapper.layout();
        let keep = layout.chunk_count(length).max(1);
        let stale = layout.chunk_count(self.replaced_len);
        for index in keep..stale {
            self.mapper.remove_chunk(index)?;
        }
        if stale > keep {
            tracing::debug!(
                path = self.mapper.path(),
                removed = stale - keep,
                "removed chunks past new length"
            );
        }
        self.replaced_len = 0;
        Ok(())
    }
}

impl Write for GridOutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_some(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        GridOutputStream::flush(self)?;
        Ok(())
    }
}

impl Drop for GridOutputStream {
    fn drop(&mut self) {
        if self.state == StreamState::Closed {
            return;
        }
        if let Err(err) = self.close() {
            tracing::warn!(
                path = self.mapper.path(),
                error = %err,
                "failed to close output stream on drop"
            );
        }
    }
}
