//! Shared state handed to every handler.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use seedwire_relay::RelaySettings;
use seedwire_telemetry::Metrics;
use seedwire_torrent_core::WorkerRegistry;

/// Dependencies shared by the HTTP handlers and the WebSocket bridge.
pub struct ApiState {
    pub(crate) registry: Arc<dyn WorkerRegistry>,
    pub(crate) settings: RelaySettings,
    pub(crate) telemetry: Metrics,
    pub(crate) started_at: DateTime<Utc>,
}

impl ApiState {
    /// Capture the dependencies and stamp the start time.
    #[must_use]
    pub fn new(
        registry: Arc<dyn WorkerRegistry>,
        settings: RelaySettings,
        telemetry: Metrics,
    ) -> Self {
        Self {
            registry,
            settings,
            telemetry,
            started_at: Utc::now(),
        }
    }

    /// Relay tunables applied to every observer connection.
    #[must_use]
    pub const fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    /// When the server state was created.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}
