//! Selection coverage: which files are fully scheduled for download.
//!
//! A file is covered when a single selection range spans every piece the
//! file touches. Piece indexes use integer truncation on both ends.

use crate::model::{SelectionRange, TorrentFile, TorrentMetadata};

/// Inclusive `(start, end)` pieces touched by `file`.
///
/// Zero-length files map onto the piece that contains their offset. Returns
/// `None` when `piece_length` is zero.
#[must_use]
pub fn piece_span(file: &TorrentFile, piece_length: u64) -> Option<(u32, u32)> {
    if piece_length == 0 {
        return None;
    }
    let start = file.offset / piece_length;
    let end = match file.length {
        0 => start,
        length => file.offset.saturating_add(length - 1) / piece_length,
    };
    Some((to_piece(start), to_piece(end)))
}

/// Whether any range in `selection` spans all pieces of `file`.
#[must_use]
pub fn is_covered(file: &TorrentFile, piece_length: u64, selection: &[SelectionRange]) -> bool {
    piece_span(file, piece_length).is_some_and(|(start, end)| {
        selection.iter().any(|range| range.spans(start, end))
    })
}

/// Coverage flag per file, in metadata order.
#[must_use]
pub fn file_coverage(metadata: &TorrentMetadata, selection: &[SelectionRange]) -> Vec<bool> {
    metadata
        .files
        .iter()
        .map(|file| is_covered(file, metadata.piece_length, selection))
        .collect()
}

fn to_piece(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
