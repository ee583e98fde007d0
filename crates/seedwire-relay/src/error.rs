//! Relay error types.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

use seedwire_events::EncodeError;

/// Errors that end a subscription or a connection.
#[derive(Debug)]
pub enum RelayError {
    /// An outbound message could not be encoded.
    Encode {
        /// Worker the message described.
        info_hash: String,
        /// Underlying encoder failure.
        source: EncodeError,
    },
    /// The transport stopped accepting outbound frames.
    ConnectionClosed,
}

impl RelayError {
    /// Whether the error only reports that the observer went away.
    #[must_use]
    pub const fn is_disconnect(&self) -> bool {
        matches!(self, Self::ConnectionClosed)
    }
}

impl Display for RelayError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode { .. } => formatter.write_str("failed to encode outbound message"),
            Self::ConnectionClosed => formatter.write_str("observer connection closed"),
        }
    }
}

impl Error for RelayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode { source, .. } => Some(source),
            Self::ConnectionClosed => None,
        }
    }
}

/// Result alias for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;
