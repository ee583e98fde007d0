//! JSON text encoding for outbound relay messages.

use crate::error::{EncodeError, EncodeResult};
use crate::payloads::RelayMessage;

/// Encode a message into the JSON text frame sent to observers.
///
/// # Errors
///
/// Returns [`EncodeError::Serialize`] if the message cannot be serialised.
pub fn encode(message: &RelayMessage) -> EncodeResult<String> {
    serde_json::to_string(message).map_err(|source| EncodeError::Serialize {
        message_type: message.kind(),
        source,
    })
}
