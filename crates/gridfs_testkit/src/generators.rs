//! Property-based test generators using proptest.
//!
//! Provides strategies for chunk sizes, file contents and sequences of
//! stream operations, plus [`ReferenceReader`], a plain in-memory model of
//! what a read stream must return for each operation.

use proptest::prelude::*;

/// Strategy for small chunk sizes, so files span many chunks.
pub fn chunk_size_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![
        3 => 1usize..=16,
        1 => 17usize..=256,
    ]
}

/// Strategy for file contents (arbitrary bytes).
pub fn file_contents_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..1024)
}

/// Strategy for grid paths.
pub fn grid_path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::string::string_regex("[a-z][a-z0-9_]{0,7}").expect("Invalid regex"),
        1..4,
    )
    .prop_map(|parts| format!("/{}", parts.join("/")))
}

/// One operation against a read stream.
#[derive(Debug, Clone)]
pub enum ReadOp {
    /// Read a single byte.
    Byte,
    /// Read into a buffer of this size.
    Bulk(usize),
    /// Skip this many bytes; may be negative.
    Skip(i64),
}

/// Strategy for a single read operation.
pub fn read_op_strategy() -> impl Strategy<Value = ReadOp> {
    prop_oneof![
        2 => Just(ReadOp::Byte),
        3 => (0usize..64).prop_map(ReadOp::Bulk),
        2 => (-8i64..64).prop_map(ReadOp::Skip),
    ]
}

/// Strategy for a sequence of read operations.
pub fn read_plan_strategy(max_ops: usize) -> impl Strategy<Value = Vec<ReadOp>> {
    prop::collection::vec(read_op_strategy(), 0..max_ops)
}

/// Splits of a byte string into consecutive write calls.
pub fn write_split_strategy(max_len: usize) -> impl Strategy<Value = (Vec<u8>, Vec<usize>)> {
    (
        prop::collection::vec(any::<u8>(), 0..max_len),
        prop::collection::vec(1usize..64, 0..32),
    )
}

/// Cuts `data` into pieces of the given sizes, cycling through them. Any
/// tail goes in a final piece.
pub fn split_by(data: &[u8], sizes: &[usize]) -> Vec<Vec<u8>> {
    if sizes.is_empty() {
        return vec![data.to_vec()];
    }
    let mut pieces = Vec::new();
    let mut rest = data;
    for size in sizes.iter().cycle() {
        if rest.is_empty() {
            break;
        }
        let n = (*size).min(rest.len());
        pieces.push(rest[..n].to_vec());
        rest = &rest[n..];
    }
    pieces
}

/// Expected outcome of one [`ReadOp`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Result of [`ReadOp::Byte`].
    Byte(Option<u8>),
    /// Result of [`ReadOp::Bulk`]: the bytes read, or `None` at end.
    Bulk(Option<Vec<u8>>),
    /// Result of [`ReadOp::Skip`]: the number of bytes skipped.
    Skipped(u64),
}

/// A read stream over a plain byte slice.
#[derive(Debug, Clone)]
pub struct ReferenceReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ReferenceReader<'a> {
    /// Creates a reader at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Returns the current offset.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Applies `op` and returns what a read stream must return for it.
    pub fn apply(&mut self, op: &ReadOp) -> ReadOutcome {
        let remaining = &self.data[self.position..];
        match *op {
            ReadOp::Byte => {
                let byte = remaining.first().copied();
                if byte.is_some() {
                    self.position += 1;
                }
                ReadOutcome::Byte(byte)
            }
            ReadOp::Bulk(0) => ReadOutcome::Bulk(Some(Vec::new())),
            ReadOp::Bulk(_) if remaining.is_empty() => ReadOutcome::Bulk(None),
            ReadOp::Bulk(len) => {
                let n = len.min(remaining.len());
                self.position += n;
                ReadOutcome::Bulk(Some(remaining[..n].to_vec()))
            }
            ReadOp::Skip(n) => {
                let n = usize::try_from(n).unwrap_or(0).min(remaining.len());
                self.position += n;
                ReadOutcome::Skipped(n as u64)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_reader_follows_stream_rules() {
        let mut reader = ReferenceReader::new(b"ABCDE");
        assert_eq!(reader.apply(&ReadOp::Skip(-3)), ReadOutcome::Skipped(0));
        assert_eq!(reader.apply(&ReadOp::Byte), ReadOutcome::Byte(Some(b'A')));
        assert_eq!(
            reader.apply(&ReadOp::Bulk(2)),
            ReadOutcome::Bulk(Some(b"BC".to_vec()))
        );
        assert_eq!(reader.apply(&ReadOp::Skip(10)), ReadOutcome::Skipped(2));
        assert_eq!(reader.apply(&ReadOp::Bulk(0)), ReadOutcome::Bulk(Some(vec![])));
        assert_eq!(reader.apply(&ReadOp::Bulk(4)), ReadOutcome::Bulk(None));
        assert_eq!(reader.apply(&ReadOp::Byte), ReadOutcome::Byte(None));
        assert_eq!(reader.position(), 5);
    }

    #[test]
    fn split_covers_all_bytes() {
        let pieces = split_by(b"ABCDEFGHI", &[2, 3]);
        assert_eq!(pieces, vec![b"AB".to_vec(), b"CDE".to_vec(), b"FG".to_vec(), b"HI".to_vec()]);
        assert_eq!(split_by(b"", &[1]), Vec::<Vec<u8>>::new());
        assert_eq!(split_by(b"AB", &[]), vec![b"AB".to_vec()]);
    }

    proptest! {
        #[test]
        fn generated_paths_are_absolute(path in grid_path_strategy()) {
            prop_assert!(path.starts_with('/'));
            prop_assert!(!path.contains(".#"));
        }

        #[test]
        fn chunk_sizes_are_positive(size in chunk_size_strategy()) {
            prop_assert!(size > 0);
        }
    }
}
