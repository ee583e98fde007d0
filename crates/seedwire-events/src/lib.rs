//! Wire-level vocabulary shared between torrent workers and relay observers.
//!
//! Workers publish [`LifecycleEvent`]s; the relay turns them into typed
//! [`RelayMessage`]s which are encoded as JSON text frames with a `type`
//! discriminator before they reach an observer connection.

pub mod codec;
pub mod error;
pub mod payloads;

pub use codec::encode;
pub use error::{EncodeError, EncodeResult};
pub use payloads::{LifecycleEvent, RelayMessage, TorrentStats};
