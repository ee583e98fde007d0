//! Encoding error primitives.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Error emitted when an outbound message cannot be encoded.
#[derive(Debug)]
pub enum EncodeError {
    /// Serialising the message to JSON failed.
    Serialize {
        /// Discriminator of the message that failed.
        message_type: &'static str,
        /// Underlying serde error.
        source: serde_json::Error,
    },
}

impl EncodeError {
    /// Discriminator of the message that failed to encode.
    #[must_use]
    pub const fn message_type(&self) -> &'static str {
        match self {
            Self::Serialize { message_type, .. } => message_type,
        }
    }
}

impl Display for EncodeError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("failed to encode relay message")
    }
}

impl Error for EncodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serialize { source, .. } => Some(source),
        }
    }
}

/// Result wrapper for encoding operations.
pub type EncodeResult<T> = Result<T, EncodeError>;
