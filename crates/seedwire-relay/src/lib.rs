#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Relay core bridging torrent worker lifecycles to observer connections.
//!
//! Transport-agnostic: a [`Connection`] consumes a stream of inbound text
//! frames and writes encoded messages into an `mpsc` channel. The HTTP crate
//! wires those two ends to a WebSocket.

mod active;
pub mod command;
pub mod connection;
pub mod error;
pub mod settings;
pub mod subscription;
pub mod throttle;
pub mod ticker;

pub use command::{Command, CommandDecodeError, CommandOutcome, dispatch_command};
pub use connection::Connection;
pub use error::{RelayError, RelayResult};
pub use settings::RelaySettings;
pub use subscription::Subscription;
pub use throttle::{EdgePolicy, Throttle, ThrottleDecision};
pub use ticker::StatsTicker;
