//! Simulated worker feed.
//!
//! Each round registers a synthetic torrent and walks it through
//! verification, download, completion and removal on a fixed step, so an
//! observer can watch the relay without a real engine behind it.

use std::sync::Arc;
use std::time::Duration;

use seedwire_events::TorrentStats;
use seedwire_torrent_core::{MemoryRegistry, MemoryWorker, TorrentMetadata, TorrentWorker};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{Instrument, info, info_span, warn};

const DEMO_PIECE_LENGTH: u64 = 16 * 1024;
const DEMO_PEERS: u32 = 6;
const DEMO_ACTIVE_PEERS: u32 = 3;

/// Pacing of the simulated feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoSettings {
    /// Delay between lifecycle steps.
    pub step: Duration,
    /// How long a finished torrent stays registered before it is destroyed.
    pub linger: Duration,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            step: Duration::from_millis(250),
            linger: Duration::from_secs(5),
        }
    }
}

/// File layout used by every demo round.
#[must_use]
pub fn demo_metadata() -> TorrentMetadata {
    TorrentMetadata::contiguous(
        DEMO_PIECE_LENGTH,
        &[
            ("demo/episode.mkv", 6 * DEMO_PIECE_LENGTH),
            ("demo/episode.srt", 1_000),
            ("demo/poster.jpg", 20_000),
        ],
    )
}

/// Info-hash assigned to the worker of `round`.
#[must_use]
pub fn demo_info_hash(round: u64) -> String {
    format!("de{round:038x}")
}

/// Run rounds back to back until the task is aborted.
#[must_use]
pub fn spawn_demo_feed(registry: Arc<MemoryRegistry>, settings: DemoSettings) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut round = 0_u64;
        loop {
            round = round.wrapping_add(1);
            run_round(&registry, round, settings)
                .instrument(info_span!("demo", round))
                .await;
        }
    })
}

/// Walk one synthetic worker through its whole lifecycle.
pub async fn run_round(registry: &MemoryRegistry, round: u64, settings: DemoSettings) {
    let info_hash = demo_info_hash(round);
    let worker = MemoryWorker::new(info_hash.clone());
    registry.insert(Arc::clone(&worker) as Arc<dyn TorrentWorker>);
    info!(info_hash = %info_hash, "demo worker registered");
    sleep(settings.step).await;

    let metadata = demo_metadata();
    let pieces = metadata.piece_count();
    let on_disk = pieces / 2;
    worker.begin_verifying(metadata);
    for piece in 0..on_disk {
        worker.verify_piece(piece);
        sleep(settings.step).await;
    }
    worker.mark_ready();
    sleep(settings.step).await;

    worker.set_interested(true);
    if let Err(err) = worker.set_file_selected(0, true) {
        warn!(info_hash = %info_hash, error = %err, "demo selection rejected");
    }
    let step_ms = u64::try_from(settings.step.as_millis())
        .unwrap_or(u64::MAX)
        .max(1);
    for piece in on_disk..pieces {
        worker.verify_piece(piece);
        worker.set_stats(TorrentStats {
            downloaded: u64::from(piece - on_disk + 1) * DEMO_PIECE_LENGTH,
            download_speed: DEMO_PIECE_LENGTH.saturating_mul(1_000) / step_ms,
            peers: DEMO_PEERS,
            active_peers: DEMO_ACTIVE_PEERS,
            queued: pieces - piece - 1,
            ..TorrentStats::default()
        });
        sleep(settings.step).await;
    }

    worker.set_interested(false);
    worker.finish();
    info!(info_hash = %info_hash, "demo worker finished");
    sleep(settings.linger).await;

    worker.destroy();
    if registry.remove(&info_hash).is_none() {
        warn!(info_hash = %info_hash, "demo worker was already unregistered");
    }
    info!(info_hash = %info_hash, "demo worker destroyed");
}
