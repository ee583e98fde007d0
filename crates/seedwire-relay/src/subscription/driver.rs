//! Task relaying one worker's lifecycle to one connection.

use std::sync::Arc;

use seedwire_events::{LifecycleEvent, RelayMessage, encode};
use seedwire_telemetry::Metrics;
use seedwire_torrent_core::{TorrentWorker, file_coverage};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use super::machine::{Action, Input, Notice, Phase, dispatch};
use crate::active::{ActiveGuard, Tracked};
use crate::error::{RelayError, RelayResult};
use crate::settings::RelaySettings;
use crate::throttle::{EdgePolicy, Throttle};
use crate::ticker::StatsTicker;

const SELECTION_KIND: &str = "selection";
const PROGRESS_KIND: &str = "download";

/// Relay for a single (connection, worker) pair.
pub struct Subscription {
    worker: Arc<dyn TorrentWorker>,
    outbound: mpsc::Sender<String>,
    settings: RelaySettings,
    metrics: Metrics,
}

struct DriverState {
    phase: Phase,
    ticker: StatsTicker,
    progress: Throttle,
    selection: Throttle,
}

impl DriverState {
    const fn new(settings: &RelaySettings) -> Self {
        Self {
            phase: Phase::AwaitingMetadata,
            ticker: StatsTicker::idle(),
            progress: Throttle::new(settings.progress_window, EdgePolicy::NONE),
            selection: Throttle::new(settings.selection_window, EdgePolicy::NONE),
        }
    }
}

impl Subscription {
    /// Bind `worker` to the connection's outbound channel.
    #[must_use]
    pub fn new(
        worker: Arc<dyn TorrentWorker>,
        outbound: mpsc::Sender<String>,
        settings: RelaySettings,
        metrics: Metrics,
    ) -> Self {
        Self {
            worker,
            outbound,
            settings,
            metrics,
        }
    }

    /// Drive the subscription until the worker is destroyed or its event
    /// stream ends.
    ///
    /// The worker event stream is attached before metadata and lifecycle are
    /// inspected, then the stages the worker already reached are replayed
    /// through the transition table. Events published in between show up
    /// twice and the table ignores the repeats.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Encode`] when a message cannot be encoded and
    /// [`RelayError::ConnectionClosed`] when the outbound channel is gone.
    pub async fn run(self) -> RelayResult<()> {
        let _active = ActiveGuard::enter(&self.metrics, Tracked::Subscription);
        let mut events = self.worker.subscribe();
        let mut state = DriverState::new(&self.settings);

        for input in self.catch_up() {
            self.apply(&mut state, input).await?;
        }

        while !state.phase.is_closed() {
            let input = tokio::select! {
                received = events.recv() => match received {
                    Ok(event) => Input::Worker(event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "subscription lagged behind worker events");
                        continue;
                    }
                    Err(RecvError::Closed) => {
                        debug!("worker event stream closed");
                        break;
                    }
                },
                _ = state.ticker.tick() => Input::Tick,
            };
            self.apply(&mut state, input).await?;
        }

        debug!(timer_running = state.ticker.is_running(), "subscription ended");
        Ok(())
    }

    fn catch_up(&self) -> Vec<Input> {
        let lifecycle = self.worker.lifecycle();
        let mut inputs = Vec::with_capacity(4);
        if self.worker.metadata().is_some() {
            inputs.push(Input::MetadataPresent);
        }
        if lifecycle.ready {
            inputs.push(Input::Worker(LifecycleEvent::Ready));
        }
        if lifecycle.finished {
            inputs.push(Input::Worker(LifecycleEvent::Finished));
        }
        if lifecycle.is_destroyed() {
            inputs.push(Input::Worker(LifecycleEvent::Destroyed));
        }
        if !inputs.is_empty() {
            debug!(phase = ?lifecycle.phase, replayed = inputs.len(), "caught up with worker");
        }
        inputs
    }

    async fn apply(&self, state: &mut DriverState, input: Input) -> RelayResult<()> {
        let transition = dispatch(state.phase, input);
        state.phase = transition.next;
        for action in transition.actions {
            self.execute(state, *action).await?;
        }
        Ok(())
    }

    async fn execute(&self, state: &mut DriverState, action: Action) -> RelayResult<()> {
        let now = Instant::now();
        match action {
            Action::Send(notice) => self.emit(self.status(notice)).await,
            Action::RequestSelection => {
                if state.selection.call_at(now).should_send() {
                    self.send_selection().await
                } else {
                    self.metrics.inc_notification_suppressed(SELECTION_KIND);
                    Ok(())
                }
            }
            Action::RequestProgress => {
                if state.progress.call_at(now).should_send() {
                    self.send_progress().await
                } else {
                    self.metrics.inc_notification_suppressed(PROGRESS_KIND);
                    Ok(())
                }
            }
            Action::FlushSelection => {
                state.selection.flush_at(now);
                self.send_selection().await
            }
            Action::FlushProgress => {
                state.progress.flush_at(now);
                self.send_progress().await
            }
            Action::StartTimer => {
                state.ticker.start(self.settings.stats_interval);
                Ok(())
            }
            Action::CancelTimer => {
                state.ticker.cancel();
                Ok(())
            }
        }
    }

    fn status(&self, notice: Notice) -> RelayMessage {
        let hash = self.worker.info_hash().to_string();
        match notice {
            Notice::Verifying => RelayMessage::Verifying {
                hash,
                stats: self.worker.stats(),
            },
            Notice::Ready => RelayMessage::Ready {
                hash,
                stats: self.worker.stats(),
            },
            Notice::Stats => RelayMessage::Stats {
                hash,
                stats: self.worker.stats(),
            },
            Notice::Interested => RelayMessage::Interested { hash },
            Notice::Uninterested => RelayMessage::Uninterested { hash },
            Notice::Finished => RelayMessage::Finished { hash },
            Notice::Destroyed => RelayMessage::Destroyed { hash },
        }
    }

    async fn send_selection(&self) -> RelayResult<()> {
        let Some(metadata) = self.worker.metadata() else {
            debug!("selection skipped: metadata unavailable");
            return Ok(());
        };
        let per_file_coverage = file_coverage(&metadata, &self.worker.selection());
        self.emit(RelayMessage::Selection {
            hash: self.worker.info_hash().to_string(),
            per_file_coverage,
        })
        .await
    }

    async fn send_progress(&self) -> RelayResult<()> {
        let progress = self.worker.bitfield().percent_complete();
        self.emit(RelayMessage::Download {
            hash: self.worker.info_hash().to_string(),
            progress,
        })
        .await
    }

    async fn emit(&self, message: RelayMessage) -> RelayResult<()> {
        let frame = encode(&message).map_err(|source| RelayError::Encode {
            info_hash: self.worker.info_hash().to_string(),
            source,
        })?;
        self.outbound
            .send(frame)
            .await
            .map_err(|_| RelayError::ConnectionClosed)?;
        self.metrics.inc_message_sent(message.kind());
        trace!(message_type = message.kind(), "relayed message");
        Ok(())
    }
}
