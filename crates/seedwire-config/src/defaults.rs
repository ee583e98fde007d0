//! Default values applied when a variable is unset.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Loopback bind address.
pub const BIND_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
/// HTTP/WebSocket listener port.
pub const HTTP_PORT: u16 = 7878;
/// Progress notification window.
pub const PROGRESS_WINDOW: Duration = Duration::from_millis(1_000);
/// Selection notification window.
pub const SELECTION_WINDOW: Duration = Duration::from_millis(2_000);
/// Stats push period.
pub const STATS_INTERVAL: Duration = Duration::from_millis(1_000);
/// Outbound frames buffered per connection.
pub const OUTBOUND_BUFFER: usize = 256;
/// Log filter when neither the config nor `RUST_LOG` sets one.
pub const LOG_LEVEL: &str = "info";
/// Upper bound for any configured window or interval.
pub(crate) const MAX_WINDOW: Duration = Duration::from_secs(3_600);
/// Upper bound for the outbound buffer.
pub(crate) const MAX_OUTBOUND_BUFFER: usize = 65_536;
