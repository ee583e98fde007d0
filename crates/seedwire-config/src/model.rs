//! Typed relay configuration.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use serde::Serialize;

use crate::defaults;

/// Fully validated configuration for one server process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayConfig {
    /// Interface the listener binds to.
    pub bind_addr: IpAddr,
    /// Listener port.
    pub http_port: u16,
    /// Minimum spacing between `download` notifications.
    pub progress_window: Duration,
    /// Minimum spacing between `selection` notifications.
    pub selection_window: Duration,
    /// Period of the `stats` push.
    pub stats_interval: Duration,
    /// Outbound frames buffered per connection.
    pub outbound_buffer: usize,
    /// Log filter directive.
    pub log_level: String,
    /// Requested log format (`json` or `pretty`); inferred when absent.
    pub log_format: Option<String>,
    /// Spawn the simulated worker feed.
    pub demo: bool,
}

impl RelayConfig {
    /// Socket address the server listens on.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.http_port)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: defaults::BIND_ADDR,
            http_port: defaults::HTTP_PORT,
            progress_window: defaults::PROGRESS_WINDOW,
            selection_window: defaults::SELECTION_WINDOW,
            stats_interval: defaults::STATS_INTERVAL,
            outbound_buffer: defaults::OUTBOUND_BUFFER,
            log_level: defaults::LOG_LEVEL.to_string(),
            log_format: None,
            demo: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_listens_on_loopback() {
        let config = RelayConfig::default();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:7878");
        assert!(!config.demo);
    }

    #[test]
    fn config_serialises_for_startup_logs() {
        let value = serde_json::to_value(RelayConfig::default()).expect("serialise");
        assert_eq!(value["http_port"], 7878);
        assert_eq!(value["outbound_buffer"], 256);
    }
}
