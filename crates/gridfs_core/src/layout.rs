//! Chunk layout arithmetic.
//!
//! Translates logical file offsets into `(chunk index, offset in chunk)`
//! pairs for a fixed chunk size. Everything here is pure arithmetic; no
//! cache is involved.

use crate::config::validate_chunk_size;
use crate::error::GridResult;

/// The fixed chunk size of one file.
///
/// Captured once when a stream opens and never re-queried, so offset
/// arithmetic stays consistent for the stream's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkLayout {
    chunk_size: usize,
}

/// The part of a file range that falls inside one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    /// Index of the chunk.
    pub index: u64,
    /// Offset of the range start within the chunk.
    pub offset_in_chunk: usize,
    /// Number of bytes of the range inside this chunk.
    pub len: usize,
}

impl ChunkLayout {
    /// Creates a layout for the given chunk size.
    ///
    /// # Errors
    ///
    /// Returns an error if `chunk_size` is zero or exceeds `u32::MAX`.
    pub fn new(chunk_size: usize) -> GridResult<Self> {
        validate_chunk_size(chunk_size)?;
        Ok(Self { chunk_size })
    }

    /// Returns the chunk size in bytes.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the index of the chunk containing `offset`.
    #[must_use]
    pub const fn chunk_index_of(&self, offset: u64) -> u64 {
        offset / self.chunk_size as u64
    }

    /// Returns the position of `offset` within its chunk.
    #[must_use]
    pub const fn offset_in_chunk(&self, offset: u64) -> usize {
        (offset % self.chunk_size as u64) as usize
    }

    /// Returns the logical offset of the first byte of chunk `index`.
    #[must_use]
    pub const fn chunk_start(&self, index: u64) -> u64 {
        index * self.chunk_size as u64
    }

    /// Returns the number of chunks a file of `file_len` bytes occupies.
    #[must_use]
    pub const fn chunk_count(&self, file_len: u64) -> u64 {
        file_len.div_ceil(self.chunk_size as u64)
    }

    /// Returns the number of bytes chunk `index` holds in a file of
    /// `file_len` bytes, or 0 if the chunk lies past the end.
    #[must_use]
    pub fn chunk_len(&self, index: u64, file_len: u64) -> usize {
        let start = self.chunk_start(index);
        if start >= file_len {
            return 0;
        }
        (file_len - start).min(self.chunk_size as u64) as usize
    }

    /// Splits `[file_offset, file_offset + len)` into per-chunk spans.
    #[must_use]
    pub fn spans(&self, mut file_offset: u64, len: u64) -> Vec<ChunkSpan> {
        let mut remaining = len;
        let mut out = Vec::new();
        while remaining > 0 {
            let offset_in_chunk = self.offset_in_chunk(file_offset);
            let take = ((self.chunk_size - offset_in_chunk) as u64).min(remaining);
            out.push(ChunkSpan {
                index: self.chunk_index_of(file_offset),
                offset_in_chunk,
                len: take as usize,
            });
            file_offset += take;
            remaining -= take;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn layout(size: usize) -> ChunkLayout {
        ChunkLayout::new(size).unwrap()
    }

    #[test]
    fn zero_chunk_size_fails() {
        assert!(ChunkLayout::new(0).is_err());
    }

    #[test]
    fn index_and_offset() {
        let l = layout(4);
        assert_eq!(l.chunk_index_of(0), 0);
        assert_eq!(l.chunk_index_of(3), 0);
        assert_eq!(l.chunk_index_of(4), 1);
        assert_eq!(l.chunk_index_of(8), 2);
        assert_eq!(l.offset_in_chunk(7), 3);
        assert_eq!(l.offset_in_chunk(8), 0);
        assert_eq!(l.chunk_start(2), 8);
    }

    #[test]
    fn nine_byte_file_in_chunks_of_four() {
        let l = layout(4);
        assert_eq!(l.chunk_count(9), 3);
        assert_eq!(l.chunk_len(0, 9), 4);
        assert_eq!(l.chunk_len(1, 9), 4);
        assert_eq!(l.chunk_len(2, 9), 1);
        assert_eq!(l.chunk_len(3, 9), 0);
    }

    #[test]
    fn evenly_divisible_file_has_full_last_chunk() {
        let l = layout(4);
        assert_eq!(l.chunk_count(8), 2);
        assert_eq!(l.chunk_len(1, 8), 4);
        assert_eq!(l.chunk_len(2, 8), 0);
    }

    #[test]
    fn empty_file_has_no_chunks() {
        let l = layout(4);
        assert_eq!(l.chunk_count(0), 0);
        assert_eq!(l.chunk_len(0, 0), 0);
    }

    #[test]
    fn spans_within_single_chunk() {
        let spans = layout(8000).spans(123, 4096);
        assert_eq!(
            spans,
            vec![ChunkSpan {
                index: 0,
                offset_in_chunk: 123,
                len: 4096
            }]
        );
    }

    #[test]
    fn spans_cross_two_boundaries() {
        let spans = layout(4).spans(2, 6);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0], ChunkSpan { index: 0, offset_in_chunk: 2, len: 2 });
        assert_eq!(spans[1], ChunkSpan { index: 1, offset_in_chunk: 0, len: 4 });
    }

    #[test]
    fn spans_of_zero_len_is_empty() {
        assert!(layout(4).spans(5, 0).is_empty());
    }

    proptest! {
        #[test]
        fn chunk_lengths_sum_to_file_len(chunk_size in 1usize..64, file_len in 0u64..2048) {
            let l = layout(chunk_size);
            let count = l.chunk_count(file_len);
            let total: u64 = (0..count).map(|i| l.chunk_len(i, file_len) as u64).sum();
            prop_assert_eq!(total, file_len);

            for i in 0..count.saturating_sub(1) {
                prop_assert_eq!(l.chunk_len(i, file_len), chunk_size);
            }
            if count > 0 {
                let last = l.chunk_len(count - 1, file_len) as u64;
                prop_assert_eq!(last, file_len - (count - 1) * chunk_size as u64);
                prop_assert!(last > 0);
            }
        }

        #[test]
        fn spans_cover_range(chunk_size in 1usize..64, offset in 0u64..1024, len in 0u64..1024) {
            let spans = layout(chunk_size).spans(offset, len);
            let total: u64 = spans.iter().map(|s| s.len as u64).sum();
            prop_assert_eq!(total, len);
            for s in &spans {
                prop_assert!(s.offset_in_chunk + s.len <= chunk_size);
            }
        }
    }
}
