//! Layout command implementation.

use gridfs_core::{chunk_key, ChunkLayout, ChunkSpan, GridResult};

/// One chunk of a file as it would sit in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRow {
    /// Chunk index.
    pub index: u64,
    /// Cache key of the chunk.
    pub key: String,
    /// Logical offset of the chunk's first byte.
    pub start: u64,
    /// Bytes stored in the chunk.
    pub len: usize,
}

/// How a file splits into chunks.
#[derive(Debug)]
pub struct LayoutReport {
    /// File length in bytes.
    pub length: u64,
    /// Chunk size in bytes.
    pub chunk_size: usize,
    /// Every chunk the file occupies.
    pub chunks: Vec<ChunkRow>,
    /// Chunks touched by the requested read, if any.
    pub read_spans: Option<Vec<ChunkSpan>>,
}

/// Computes the layout of a file at `path` of `length` bytes.
///
/// `read` is an optional `(offset, len)` read; it is clipped to the file the
/// way a read stream would clip it.
pub fn describe(
    path: &str,
    length: u64,
    chunk_size: usize,
    read: Option<(u64, u64)>,
) -> GridResult<LayoutReport> {
    let layout = ChunkLayout::new(chunk_size)?;
    // An empty file still owns an empty chunk 0.
    let count = layout.chunk_count(length).max(1);
    let chunks = (0..count)
        .map(|index| ChunkRow {
            index,
            key: chunk_key(path, index),
            start: layout.chunk_start(index),
            len: layout.chunk_len(index, length),
        })
        .collect();

    let read_spans = read.map(|(offset, len)| {
        let offset = offset.min(length);
        let len = len.min(length - offset);
        layout.spans(offset, len)
    });

    Ok(LayoutReport {
        length,
        chunk_size,
        chunks,
        read_spans,
    })
}

/// Runs the layout command.
pub fn run(
    path: &str,
    length: u64,
    chunk_size: usize,
    read: Option<(u64, u64)>,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = describe(path, length, chunk_size, read)?;

    println!("File: {}", path);
    println!("Length: {} bytes", report.length);
    println!("Chunk size: {} bytes", report.chunk_size);
    println!("Chunks: {}", report.chunks.len());
    println!();
    println!("{:>8}  {:>12}  {:>10}  key", "index", "start", "len");
    for row in &report.chunks {
        println!(
            "{:>8}  {:>12}  {:>10}  {}",
            row.index, row.start, row.len, row.key
        );
    }

    if let (Some(spans), Some((offset, len))) = (&report.read_spans, read) {
        println!();
        println!("Read of {} bytes at offset {}:", len, offset);
        if spans.is_empty() {
            println!("  (nothing to read)");
        }
        for span in spans {
            println!(
                "  chunk {} bytes {}..{}",
                span.index,
                span.offset_in_chunk,
                span.offset_in_chunk + span.len
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nine_bytes_in_chunks_of_four() {
        let report = describe("/f", 9, 4, None).unwrap();
        let lens: Vec<_> = report.chunks.iter().map(|c| c.len).collect();
        assert_eq!(lens, vec![4, 4, 1]);
        assert_eq!(report.chunks[2].key, "/f.#2");
        assert_eq!(report.chunks[2].start, 8);
        assert!(report.read_spans.is_none());
    }

    #[test]
    fn empty_file_has_one_empty_chunk() {
        let report = describe("/f", 0, 4, None).unwrap();
        assert_eq!(
            report.chunks,
            vec![ChunkRow {
                index: 0,
                key: "/f.#0".into(),
                start: 0,
                len: 0,
            }]
        );
    }

    #[test]
    fn read_is_clipped_to_file() {
        let report = describe("/f", 9, 4, Some((6, 100))).unwrap();
        let spans = report.read_spans.unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].index, spans[0].offset_in_chunk, spans[0].len), (1, 2, 2));
        assert_eq!((spans[1].index, spans[1].offset_in_chunk, spans[1].len), (2, 0, 1));

        let past_end = describe("/f", 9, 4, Some((20, 5))).unwrap();
        assert!(past_end.read_spans.unwrap().is_empty());
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        assert!(describe("/f", 9, 0, None).is_err());
        assert!(run("/f", 9, 0, None).is_err());
    }
}
