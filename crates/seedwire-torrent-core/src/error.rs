//! Error types for torrent worker operations.

use thiserror::Error;

/// Primary error type for worker operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TorrentError {
    /// File index does not exist in the worker's file list.
    #[error("file index out of range")]
    FileIndexOutOfRange {
        /// Worker info-hash.
        info_hash: String,
        /// Requested index.
        index: usize,
        /// Number of files the worker exposes.
        file_count: usize,
    },
    /// Operation needs torrent metadata that has not been fetched yet.
    #[error("torrent metadata unavailable")]
    MetadataUnavailable {
        /// Worker info-hash.
        info_hash: String,
    },
}

/// Convenience alias for worker operation results.
pub type TorrentResult<T> = Result<T, TorrentError>;
