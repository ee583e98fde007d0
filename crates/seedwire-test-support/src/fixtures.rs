//! Test fixtures and channel helpers.

use std::time::Duration;

use seedwire_telemetry::Metrics;
use seedwire_torrent_core::TorrentMetadata;
use tokio::sync::mpsc;

pub use crate::frames::FrameLog;

/// Piece length used by [`sample_metadata`].
pub const SAMPLE_PIECE_LENGTH: u64 = 16 * 1024;

/// Three files over five pieces: two pieces, one and a half, then one and a half.
#[must_use]
pub fn sample_metadata() -> TorrentMetadata {
    TorrentMetadata::contiguous(
        SAMPLE_PIECE_LENGTH,
        &[
            ("video.mkv", 2 * SAMPLE_PIECE_LENGTH),
            ("subs.srt", SAMPLE_PIECE_LENGTH + SAMPLE_PIECE_LENGTH / 2),
            ("cover.jpg", SAMPLE_PIECE_LENGTH + SAMPLE_PIECE_LENGTH / 2),
        ],
    )
}

/// Fresh metrics registry.
///
/// # Panics
///
/// Panics if the Prometheus collectors cannot be registered.
#[must_use]
pub fn relay_metrics() -> Metrics {
    Metrics::new().expect("metrics registry")
}

/// Take every frame currently buffered without waiting.
pub fn drain_frames(rx: &mut mpsc::Receiver<String>) -> Vec<String> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(frame);
    }
    frames
}

/// Let spawned tasks run. Under a paused clock this advances virtual time
/// by a few milliseconds, well below any relay window.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}
