//! Tunables shared by every connection.

use std::time::Duration;

/// Default progress notification window.
pub const DEFAULT_PROGRESS_WINDOW: Duration = Duration::from_millis(1_000);
/// Default selection notification window.
pub const DEFAULT_SELECTION_WINDOW: Duration = Duration::from_millis(2_000);
/// Default stats push period.
pub const DEFAULT_STATS_INTERVAL: Duration = Duration::from_millis(1_000);
/// Default outbound frame buffer per connection.
pub const DEFAULT_OUTBOUND_BUFFER: usize = 256;

/// Relay timing and buffering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelaySettings {
    /// Minimum spacing between `download` notifications.
    pub progress_window: Duration,
    /// Minimum spacing between `selection` notifications.
    pub selection_window: Duration,
    /// Period of the `stats` push.
    pub stats_interval: Duration,
    /// Outbound frames buffered before subscriptions wait on the transport.
    pub outbound_buffer: usize,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            progress_window: DEFAULT_PROGRESS_WINDOW,
            selection_window: DEFAULT_SELECTION_WINDOW,
            stats_interval: DEFAULT_STATS_INTERVAL,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        }
    }
}
