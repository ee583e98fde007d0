//! In-process reference engine.
//!
//! `MemoryWorker` keeps its state behind a mutex and publishes lifecycle
//! events through a broadcast channel, matching what a real engine exposes
//! through [`TorrentWorker`]. Used by the demo feed and the test suites.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use seedwire_events::{LifecycleEvent, TorrentStats};
use tokio::sync::broadcast;
use tracing::debug;

use crate::bitfield::Bitfield;
use crate::error::{TorrentError, TorrentResult};
use crate::lifecycle::LifecycleState;
use crate::model::{SelectionRange, TorrentMetadata};
use crate::registry::{WorkerCreated, WorkerRegistry};
use crate::selection::piece_span;
use crate::worker::{SwarmControl, TorrentWorker};

const EVENT_CAPACITY: usize = 256;
const DEFAULT_REGISTRY_CAPACITY: usize = 64;

#[derive(Default)]
struct MemorySwarm {
    paused: AtomicBool,
}

impl SwarmControl for MemorySwarm {
    fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct WorkerState {
    metadata: Option<Arc<TorrentMetadata>>,
    bitfield: Bitfield,
    selection: Vec<SelectionRange>,
    stats: TorrentStats,
    lifecycle: LifecycleState,
}

/// Worker whose lifecycle is driven programmatically.
pub struct MemoryWorker {
    info_hash: String,
    events: broadcast::Sender<LifecycleEvent>,
    state: Mutex<WorkerState>,
    swarm: Option<Arc<MemorySwarm>>,
}

impl MemoryWorker {
    /// Worker attached to a swarm, still waiting for metadata.
    #[must_use]
    pub fn new(info_hash: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::build(info_hash.into(), true))
    }

    /// Worker that never joined a swarm; pause and resume have no target.
    #[must_use]
    pub fn detached(info_hash: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::build(info_hash.into(), false))
    }

    fn build(info_hash: String, with_swarm: bool) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            info_hash,
            events,
            state: Mutex::new(WorkerState::default()),
            swarm: with_swarm.then(|| Arc::new(MemorySwarm::default())),
        }
    }

    /// Install metadata, reset the completion map and emit `verifying`.
    pub fn begin_verifying(&self, metadata: TorrentMetadata) {
        {
            let mut state = self.lock();
            state.bitfield = Bitfield::new(metadata.piece_count());
            state.metadata = Some(Arc::new(metadata));
        }
        self.emit(LifecycleEvent::Verifying);
    }

    /// Mark `piece` verified and emit a `verify` tick.
    pub fn verify_piece(&self, piece: u32) {
        let accepted = self.lock().bitfield.set(piece);
        if accepted {
            self.emit(LifecycleEvent::Verify { piece });
        }
    }

    /// Emit `ready`.
    pub fn mark_ready(&self) {
        self.emit(LifecycleEvent::Ready);
    }

    /// Emit `interested` or `uninterested`.
    pub fn set_interested(&self, interested: bool) {
        self.emit(if interested {
            LifecycleEvent::Interested
        } else {
            LifecycleEvent::Uninterested
        });
    }

    /// Emit `finished`.
    pub fn finish(&self) {
        self.emit(LifecycleEvent::Finished);
    }

    /// Emit the terminal `destroyed` event.
    pub fn destroy(&self) {
        self.emit(LifecycleEvent::Destroyed);
    }

    /// Replace transfer counters. `paused` is always taken from the swarm.
    pub fn set_stats(&self, stats: TorrentStats) {
        self.lock().stats = stats;
    }

    /// Whether the swarm is paused. Detached workers report `false`.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.swarm
            .as_ref()
            .is_some_and(|swarm| swarm.paused.load(Ordering::SeqCst))
    }

    fn emit(&self, event: LifecycleEvent) {
        self.lock().lifecycle.record(event);
        if self.events.send(event).is_err() {
            debug!(
                info_hash = %self.info_hash,
                event = event.name(),
                "lifecycle event had no subscribers"
            );
        }
    }

    fn lock(&self) -> MutexGuard<'_, WorkerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TorrentWorker for MemoryWorker {
    fn info_hash(&self) -> &str {
        &self.info_hash
    }

    fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    fn lifecycle(&self) -> LifecycleState {
        self.lock().lifecycle
    }

    fn metadata(&self) -> Option<Arc<TorrentMetadata>> {
        self.lock().metadata.clone()
    }

    fn bitfield(&self) -> Bitfield {
        self.lock().bitfield.clone()
    }

    fn selection(&self) -> Vec<SelectionRange> {
        self.lock().selection.clone()
    }

    fn stats(&self) -> TorrentStats {
        let mut stats = self.lock().stats.clone();
        stats.paused = self.is_paused();
        stats
    }

    fn swarm(&self) -> Option<Arc<dyn SwarmControl>> {
        self.swarm
            .clone()
            .map(|swarm| swarm as Arc<dyn SwarmControl>)
    }

    fn set_file_selected(&self, index: usize, selected: bool) -> TorrentResult<()> {
        let mut state = self.lock();
        let metadata = state
            .metadata
            .clone()
            .ok_or_else(|| TorrentError::MetadataUnavailable {
                info_hash: self.info_hash.clone(),
            })?;
        let file = metadata
            .files
            .get(index)
            .ok_or_else(|| TorrentError::FileIndexOutOfRange {
                info_hash: self.info_hash.clone(),
                index,
                file_count: metadata.files.len(),
            })?;
        let Some((from, to)) = piece_span(file, metadata.piece_length) else {
            return Ok(());
        };
        let range = SelectionRange::new(from, to);
        if selected {
            if !state.selection.contains(&range) {
                state.selection.push(range);
            }
        } else {
            state.selection.retain(|existing| *existing != range);
        }
        Ok(())
    }
}

/// Registry holding workers in a map and broadcasting creations.
pub struct MemoryRegistry {
    workers: Mutex<HashMap<String, Arc<dyn TorrentWorker>>>,
    created: broadcast::Sender<WorkerCreated>,
}

impl MemoryRegistry {
    /// Registry with the default creation-channel capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_REGISTRY_CAPACITY)
    }

    /// Registry whose creation channel buffers `capacity` notifications.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "registry capacity must be positive");
        let (created, _) = broadcast::channel(capacity);
        Self {
            workers: Mutex::new(HashMap::new()),
            created,
        }
    }

    /// Store `worker` and notify subscribers. Replaces any worker with the same hash.
    pub fn insert(&self, worker: Arc<dyn TorrentWorker>) {
        let info_hash = worker.info_hash().to_string();
        self.lock().insert(info_hash.clone(), Arc::clone(&worker));
        if self
            .created
            .send(WorkerCreated {
                info_hash: info_hash.clone(),
                worker,
            })
            .is_err()
        {
            debug!(info_hash = %info_hash, "worker created with no subscribers");
        }
    }

    /// Drop a worker from the registry, returning it when present.
    #[must_use]
    pub fn remove(&self, info_hash: &str) -> Option<Arc<dyn TorrentWorker>> {
        self.lock().remove(info_hash)
    }

    /// Number of registered workers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no workers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<dyn TorrentWorker>>> {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerRegistry for MemoryRegistry {
    fn get(&self, info_hash: &str) -> Option<Arc<dyn TorrentWorker>> {
        self.lock().get(info_hash).cloned()
    }

    fn subscribe_created(&self) -> broadcast::Receiver<WorkerCreated> {
        self.created.subscribe()
    }
}
