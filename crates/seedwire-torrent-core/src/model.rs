//! Static torrent metadata shared across the workspace.

use serde::{Deserialize, Serialize};

/// Individual file exposed by a torrent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TorrentFile {
    /// Relative path of the file within the torrent payload.
    pub path: String,
    /// Byte offset of the file within the concatenated payload.
    pub offset: u64,
    /// File size in bytes.
    pub length: u64,
}

impl TorrentFile {
    /// Construct a file entry.
    #[must_use]
    pub fn new(path: impl Into<String>, offset: u64, length: u64) -> Self {
        Self {
            path: path.into(),
            offset,
            length,
        }
    }
}

/// Metadata that only exists once the worker has the info dictionary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TorrentMetadata {
    /// Bytes per piece.
    pub piece_length: u64,
    /// Files in metainfo order. Indexes are stable.
    pub files: Vec<TorrentFile>,
}

impl TorrentMetadata {
    /// Lay out `sizes` back to back, assigning offsets in order.
    #[must_use]
    pub fn contiguous(piece_length: u64, sizes: &[(&str, u64)]) -> Self {
        let mut offset = 0;
        let files = sizes
            .iter()
            .map(|(path, length)| {
                let file = TorrentFile::new(*path, offset, *length);
                offset += length;
                file
            })
            .collect();
        Self {
            piece_length,
            files,
        }
    }

    /// Total payload size in bytes.
    #[must_use]
    pub fn total_length(&self) -> u64 {
        self.files
            .iter()
            .map(|file| file.offset.saturating_add(file.length))
            .max()
            .unwrap_or(0)
    }

    /// Number of pieces needed to cover the payload.
    #[must_use]
    pub fn piece_count(&self) -> u32 {
        if self.piece_length == 0 {
            return 0;
        }
        let pieces = self.total_length().div_ceil(self.piece_length);
        u32::try_from(pieces).unwrap_or(u32::MAX)
    }
}

/// Inclusive range of piece indexes scheduled for download.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectionRange {
    /// First scheduled piece.
    pub from: u32,
    /// Last scheduled piece (inclusive).
    pub to: u32,
}

impl SelectionRange {
    /// Construct a range covering `from..=to`.
    #[must_use]
    pub const fn new(from: u32, to: u32) -> Self {
        Self { from, to }
    }

    /// Whether this range spans the whole of `start..=end`.
    #[must_use]
    pub const fn spans(&self, start: u32, end: u32) -> bool {
        self.from <= start && self.to >= end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_assigns_offsets_in_order() {
        let metadata = TorrentMetadata::contiguous(16, &[("a", 10), ("b", 30), ("c", 0)]);
        let offsets: Vec<u64> = metadata.files.iter().map(|file| file.offset).collect();
        assert_eq!(offsets, vec![0, 10, 40]);
        assert_eq!(metadata.total_length(), 40);
        assert_eq!(metadata.piece_count(), 3);
    }

    #[test]
    fn piece_count_handles_degenerate_inputs() {
        let empty = TorrentMetadata {
            piece_length: 16,
            files: Vec::new(),
        };
        assert_eq!(empty.piece_count(), 0);

        let zero_piece = TorrentMetadata::contiguous(0, &[("a", 10)]);
        assert_eq!(zero_piece.piece_count(), 0);
    }

    #[test]
    fn range_spans_is_inclusive() {
        let range = SelectionRange::new(2, 5);
        assert!(range.spans(2, 5));
        assert!(range.spans(3, 3));
        assert!(!range.spans(1, 5));
        assert!(!range.spans(2, 6));
    }
}
