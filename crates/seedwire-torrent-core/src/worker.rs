//! Worker collaborator interface consumed by the relay.

use std::sync::Arc;

use seedwire_events::{LifecycleEvent, TorrentStats};
use tokio::sync::broadcast;

use crate::bitfield::Bitfield;
use crate::error::TorrentResult;
use crate::lifecycle::LifecycleState;
use crate::model::{SelectionRange, TorrentMetadata};

/// Swarm capability exposed by workers that participate in peer exchange.
pub trait SwarmControl: Send + Sync {
    /// Stop requesting and serving pieces.
    fn pause(&self);

    /// Resume requesting and serving pieces.
    fn resume(&self);
}

/// A long-running torrent worker owned by the engine.
///
/// Reads are synchronous snapshots; implementations must not block.
pub trait TorrentWorker: Send + Sync {
    /// Unique info-hash identifying the worker.
    fn info_hash(&self) -> &str;

    /// Subscribe to lifecycle events emitted from now on.
    fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent>;

    /// Lifecycle reached so far.
    ///
    /// Must already reflect an event by the time that event is published, so
    /// calling this after [`subscribe`](Self::subscribe) leaves no gap.
    fn lifecycle(&self) -> LifecycleState;

    /// Piece length and file list, absent until verification starts.
    fn metadata(&self) -> Option<Arc<TorrentMetadata>>;

    /// Current piece completion map.
    fn bitfield(&self) -> Bitfield;

    /// Piece ranges currently scheduled for download.
    fn selection(&self) -> Vec<SelectionRange>;

    /// Aggregate transfer statistics.
    fn stats(&self) -> TorrentStats;

    /// Swarm capability, when the worker has joined one.
    fn swarm(&self) -> Option<Arc<dyn SwarmControl>>;

    /// Schedule or unschedule the pieces of the file at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if metadata is unavailable or `index` is out of range.
    fn set_file_selected(&self, index: usize, selected: bool) -> TorrentResult<()>;
}
