//! Event payload types carried between workers and observers.

use serde::{Deserialize, Serialize};

/// Lifecycle notifications emitted by a torrent worker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// Static metadata is available and piece verification has started.
    Verifying,
    /// Verification completed; the worker can start transferring.
    Ready,
    /// The worker wants pieces from the swarm.
    Interested,
    /// The worker has nothing left to request.
    Uninterested,
    /// A single piece finished hash verification.
    Verify {
        /// Index of the verified piece.
        piece: u32,
    },
    /// Every selected piece is present on disk.
    Finished,
    /// The worker was torn down. No further events follow.
    Destroyed,
}

impl LifecycleEvent {
    /// Stable name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Verifying => "verifying",
            Self::Ready => "ready",
            Self::Interested => "interested",
            Self::Uninterested => "uninterested",
            Self::Verify { .. } => "verify",
            Self::Finished => "finished",
            Self::Destroyed => "destroyed",
        }
    }
}

/// Aggregate transfer statistics attached to status messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TorrentStats {
    /// Bytes received from the swarm.
    pub downloaded: u64,
    /// Bytes sent to the swarm.
    pub uploaded: u64,
    /// Current receive rate in bytes per second.
    pub download_speed: u64,
    /// Current send rate in bytes per second.
    pub upload_speed: u64,
    /// Connected peers.
    pub peers: u32,
    /// Peers currently unchoking us.
    pub active_peers: u32,
    /// Outstanding piece requests.
    pub queued: u32,
    /// Whether the swarm is paused.
    pub paused: bool,
}

/// Messages pushed to observers. Serialised with a `type` discriminator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayMessage {
    /// Verification started.
    Verifying {
        /// Worker info-hash.
        hash: String,
        /// Stats at the time of installation.
        stats: TorrentStats,
    },
    /// Verification finished.
    Ready {
        /// Worker info-hash.
        hash: String,
        /// Stats when the worker became ready.
        stats: TorrentStats,
    },
    /// The worker became interested in swarm pieces.
    Interested {
        /// Worker info-hash.
        hash: String,
    },
    /// The worker lost interest in swarm pieces.
    Uninterested {
        /// Worker info-hash.
        hash: String,
    },
    /// Periodic stats sample.
    Stats {
        /// Worker info-hash.
        hash: String,
        /// Current stats.
        stats: TorrentStats,
    },
    /// Verified-piece progress, as a percentage.
    Download {
        /// Worker info-hash.
        hash: String,
        /// Percentage of verified pieces in `0.0..=100.0`.
        progress: f64,
    },
    /// Per-file selection coverage, in file order.
    Selection {
        /// Worker info-hash.
        hash: String,
        /// `true` when every piece of the file is scheduled.
        #[serde(rename = "perFileCoverage")]
        per_file_coverage: Vec<bool>,
    },
    /// All selected data is present.
    Finished {
        /// Worker info-hash.
        hash: String,
    },
    /// The worker was torn down.
    Destroyed {
        /// Worker info-hash.
        hash: String,
    },
}

impl RelayMessage {
    /// Machine-friendly discriminator, identical to the serialised `type`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Verifying { .. } => "verifying",
            Self::Ready { .. } => "ready",
            Self::Interested { .. } => "interested",
            Self::Uninterested { .. } => "uninterested",
            Self::Stats { .. } => "stats",
            Self::Download { .. } => "download",
            Self::Selection { .. } => "selection",
            Self::Finished { .. } => "finished",
            Self::Destroyed { .. } => "destroyed",
        }
    }

    /// Info-hash of the worker the message describes.
    #[must_use]
    pub fn hash(&self) -> &str {
        match self {
            Self::Verifying { hash, .. }
            | Self::Ready { hash, .. }
            | Self::Interested { hash }
            | Self::Uninterested { hash }
            | Self::Stats { hash, .. }
            | Self::Download { hash, .. }
            | Self::Selection { hash, .. }
            | Self::Finished { hash }
            | Self::Destroyed { hash } => hash,
        }
    }
}
