//! One observer session.
//!
//! # Design
//! - A single task multiplexes inbound frames, registry notifications and
//!   subscription completions, so per-connection bookkeeping needs no locks.
//! - Each worker gets at most one live subscription. A worker whose
//!   subscription has ended may be installed again.
//! - Closing the connection aborts every subscription it owns.

use std::collections::HashMap;
use std::sync::Arc;

use seedwire_telemetry::Metrics;
use seedwire_torrent_core::{TorrentWorker, WorkerCreated, WorkerRegistry};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::{self, JoinSet};
use tokio_stream::{Stream, StreamExt};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::active::{ActiveGuard, Tracked};
use crate::command::{Command, CommandOutcome, dispatch_command};
use crate::error::RelayResult;
use crate::settings::RelaySettings;
use crate::subscription::Subscription;

type Subscriptions = JoinSet<RelayResult<()>>;

/// Relay session between the worker registry and one observer.
pub struct Connection {
    id: Uuid,
    registry: Arc<dyn WorkerRegistry>,
    settings: RelaySettings,
    metrics: Metrics,
}

impl Connection {
    /// New session with a random identifier.
    #[must_use]
    pub fn new(registry: Arc<dyn WorkerRegistry>, settings: RelaySettings, metrics: Metrics) -> Self {
        Self {
            id: Uuid::new_v4(),
            registry,
            settings,
            metrics,
        }
    }

    /// Session identifier used in logs.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Settings the session was created with.
    #[must_use]
    pub const fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    /// Serve the session until `inbound` ends or the observer stops reading.
    ///
    /// `inbound` yields decoded text frames; `outbound` receives encoded
    /// messages in per-worker order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RelayError::Encode`] when a subscription fails to
    /// encode a message. The transport should log it and close the socket.
    pub async fn run<S>(self, mut inbound: S, outbound: mpsc::Sender<String>) -> RelayResult<()>
    where
        S: Stream<Item = String> + Unpin,
    {
        let _active = ActiveGuard::enter(&self.metrics, Tracked::Connection);
        let mut created = self.registry.subscribe_created();
        let mut registry_open = true;
        let mut subscriptions = Subscriptions::new();
        let mut live: HashMap<String, task::Id> = HashMap::new();
        info!(connection_id = %self.id, "observer connected");

        let outcome = loop {
            tokio::select! {
                frame = inbound.next() => match frame {
                    Some(text) => self.handle_frame(&text),
                    None => break Ok(()),
                },
                notification = created.recv(), if registry_open => match notification {
                    Ok(WorkerCreated { info_hash, worker }) => {
                        self.install(&mut subscriptions, &mut live, info_hash, worker, &outbound);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(connection_id = %self.id, skipped, "missed worker notifications");
                    }
                    Err(RecvError::Closed) => {
                        debug!(connection_id = %self.id, "worker registry closed");
                        registry_open = false;
                    }
                },
                Some(joined) = subscriptions.join_next_with_id() => match joined {
                    Ok((task_id, result)) => {
                        live.retain(|_, id| *id != task_id);
                        match result {
                            Ok(()) => {}
                            Err(err) if err.is_disconnect() => break Ok(()),
                            Err(err) => break Err(err),
                        }
                    }
                    Err(join_err) => {
                        let task_id = join_err.id();
                        live.retain(|_, id| *id != task_id);
                        warn!(connection_id = %self.id, error = %join_err, "subscription task failed");
                    }
                },
            }
        };

        let remaining = subscriptions.len();
        subscriptions.shutdown().await;
        info!(
            connection_id = %self.id,
            aborted_subscriptions = remaining,
            "observer disconnected"
        );
        outcome
    }

    fn install(
        &self,
        subscriptions: &mut Subscriptions,
        live: &mut HashMap<String, task::Id>,
        info_hash: String,
        worker: Arc<dyn TorrentWorker>,
        outbound: &mpsc::Sender<String>,
    ) {
        if live.contains_key(&info_hash) {
            debug!(
                connection_id = %self.id,
                info_hash = %info_hash,
                "worker already subscribed"
            );
            return;
        }

        let span = info_span!("subscription", connection_id = %self.id, info_hash = %info_hash);
        let subscription = Subscription::new(
            worker,
            outbound.clone(),
            self.settings,
            self.metrics.clone(),
        );
        let handle = subscriptions.spawn(subscription.run().instrument(span));
        live.insert(info_hash, handle.id());
    }

    fn handle_frame(&self, text: &str) {
        let command = match Command::decode(text) {
            Ok(command) => command,
            Err(err) => {
                debug!(connection_id = %self.id, error = %err, "ignoring control frame");
                return;
            }
        };

        let outcome = dispatch_command(self.registry.as_ref(), &command);
        self.metrics.inc_command(command.name(), outcome.label());
        match &outcome {
            CommandOutcome::Applied => debug!(
                connection_id = %self.id,
                command = command.name(),
                info_hash = command.info_hash(),
                file_index = command.file_index(),
                "command applied"
            ),
            CommandOutcome::UnknownTorrent | CommandOutcome::MissingCapability => debug!(
                connection_id = %self.id,
                command = command.name(),
                info_hash = command.info_hash(),
                outcome = outcome.label(),
                "command ignored"
            ),
            CommandOutcome::Rejected(err) => warn!(
                connection_id = %self.id,
                command = command.name(),
                info_hash = command.info_hash(),
                file_index = command.file_index(),
                error = %err,
                "worker rejected command"
            ),
        }
    }
}
