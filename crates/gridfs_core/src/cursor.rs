//! Position tracking shared by the read and write streams.

use crate::layout::ChunkLayout;

/// Lifecycle of a stream. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StreamState {
    Open,
    Closed,
}

/// Logical offset, current chunk buffer and offset within that buffer.
///
/// On the read side the buffer holds the fetched chunk and
/// `offset_in_chunk` is the next byte to hand out. On the write side the
/// buffer holds the bytes written so far for the current chunk and
/// `offset_in_chunk` equals its length.
///
/// Whenever the buffer covers the chunk at `position`,
/// `offset_in_chunk == position % chunk_size` (or `chunk_size` when the
/// buffer has been consumed or filled exactly).
#[derive(Debug)]
pub(crate) struct ChunkCursor {
    layout: ChunkLayout,
    position: u64,
    chunk: Option<Vec<u8>>,
    offset_in_chunk: usize,
}

impl ChunkCursor {
    pub(crate) fn new(layout: ChunkLayout) -> Self {
        Self {
            layout,
            position: 0,
            chunk: None,
            offset_in_chunk: 0,
        }
    }

    /// Creates a write cursor at `position` whose buffer already holds
    /// `chunk`, the leading bytes of the chunk containing `position`.
    pub(crate) fn for_append(layout: ChunkLayout, position: u64, chunk: Vec<u8>) -> Self {
        debug_assert_eq!(chunk.len(), layout.offset_in_chunk(position));
        Self {
            layout,
            position,
            offset_in_chunk: chunk.len(),
            chunk: Some(chunk),
        }
    }

    pub(crate) const fn layout(&self) -> ChunkLayout {
        self.layout
    }

    pub(crate) const fn position(&self) -> u64 {
        self.position
    }

    /// Index of the chunk containing `position`.
    pub(crate) const fn chunk_index(&self) -> u64 {
        self.layout.chunk_index_of(self.position)
    }

    /// Index of the chunk the buffer belongs to.
    pub(crate) const fn buffered_chunk_index(&self) -> u64 {
        self.layout
            .chunk_index_of(self.position - self.offset_in_chunk as u64)
    }

    /// Bytes of the buffer not yet read.
    pub(crate) fn readable_in_chunk(&self) -> usize {
        self.chunk
            .as_ref()
            .map_or(0, |chunk| chunk.len() - self.offset_in_chunk)
    }

    /// Room left in the buffer before it reaches the chunk size.
    pub(crate) const fn writable_in_chunk(&self) -> usize {
        self.layout.chunk_size() - self.offset_in_chunk
    }

    /// The unread part of the buffer.
    pub(crate) fn unread(&self) -> &[u8] {
        match self.chunk.as_deref() {
            Some(chunk) => &chunk[self.offset_in_chunk..],
            None => &[],
        }
    }

    /// The bytes buffered so far.
    pub(crate) fn buffered(&self) -> &[u8] {
        self.chunk.as_deref().unwrap_or(&[])
    }

    /// Replaces the buffer with a freshly fetched chunk covering `position`.
    pub(crate) fn load(&mut self, chunk: Vec<u8>) {
        self.offset_in_chunk = self.layout.offset_in_chunk(self.position);
        debug_assert!(self.offset_in_chunk <= chunk.len());
        self.chunk = Some(chunk);
    }

    /// Drops the buffer.
    pub(crate) fn unload(&mut self) {
        self.chunk = None;
        self.offset_in_chunk = 0;
    }

    /// Moves forward by `n` bytes inside the buffer.
    pub(crate) fn advance(&mut self, n: usize) {
        self.offset_in_chunk += n;
        self.position += n as u64;
        debug_assert!(self.offset_in_chunk <= self.layout.chunk_size());
        tracing::trace!(
            position = self.position,
            offset_in_chunk = self.offset_in_chunk,
            "cursor advanced"
        );
    }

    /// Moves forward by `n` bytes past the buffer and drops it.
    pub(crate) fn jump(&mut self, n: u64) {
        self.position += n;
        self.unload();
        tracing::trace!(position = self.position, "cursor jumped");
    }

    /// Appends `bytes` to the write buffer.
    pub(crate) fn append(&mut self, bytes: &[u8]) {
        debug_assert!(bytes.len() <= self.writable_in_chunk());
        let chunk_size = self.layout.chunk_size();
        self.chunk
            .get_or_insert_with(|| Vec::with_capacity(chunk_size))
            .extend_from_slice(bytes);
        self.advance(bytes.len());
    }

    /// Empties the write buffer after it was stored; the next write starts
    /// a new chunk at the current position.
    pub(crate) fn start_next_chunk(&mut self) {
        if let Some(chunk) = self.chunk.as_mut() {
            chunk.clear();
        }
        self.offset_in_chunk = 0;
    }

    /// Resets the cursor to offset zero with no buffer.
    pub(crate) fn reset(&mut self) {
        self.position = 0;
        self.unload();
    }
}
