//! Worker registry collaborator interface.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::worker::TorrentWorker;

/// Notification that a worker joined the registry.
#[derive(Clone)]
pub struct WorkerCreated {
    /// Info-hash of the new worker.
    pub info_hash: String,
    /// Handle to the worker.
    pub worker: Arc<dyn TorrentWorker>,
}

impl Debug for WorkerCreated {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("WorkerCreated")
            .field("info_hash", &self.info_hash)
            .finish_non_exhaustive()
    }
}

/// Authoritative source of workers keyed by info-hash.
pub trait WorkerRegistry: Send + Sync {
    /// Look up a worker by info-hash.
    fn get(&self, info_hash: &str) -> Option<Arc<dyn TorrentWorker>>;

    /// Subscribe to workers created from now on.
    fn subscribe_created(&self) -> broadcast::Receiver<WorkerCreated>;
}
