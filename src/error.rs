//! Error types for the chat transport client
//!
//! Expected transport failures (handshake rejection, network drop) surface as
//! state transitions or `Result` values rather than panics; teardown-time
//! failures are logged by the registry and never propagated.

/// Convenience result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for transport and protocol operations
#[derive(Debug)]
pub enum Error {
    /// Connect attempted without an auth token; no network attempt is made
    AuthMissing,
    /// Connect handshake was rejected or timed out
    ConnectFailed(String),
    /// A send was attempted while the connection is not in the Connected state
    NotConnected,
    /// A topic subscription could not be established
    SubscribeFailed {
        /// Topic the subscription was requested for
        topic: String,
    },
    /// A subscription could not be released during teardown
    Unsubscribe {
        /// Topic the release was requested for
        topic: String,
    },
    /// An inbound frame body could not be decoded
    Decode(DecodeError),
    /// The underlying transport task has gone away
    TransportClosed,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::AuthMissing => write!(f, "Auth token missing"),
            Error::ConnectFailed(reason) => write!(f, "Connect failed: {}", reason),
            Error::NotConnected => write!(f, "Not connected"),
            Error::SubscribeFailed { topic } => write!(f, "Subscribe failed: {}", topic),
            Error::Unsubscribe { topic } => write!(f, "Unsubscribe failed: {}", topic),
            Error::Decode(err) => write!(f, "Decode error: {}", err),
            Error::TransportClosed => write!(f, "Transport closed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Decode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Error::Decode(err)
    }
}

/// Error type for inbound frame decoding
///
/// Returned by the codec instead of panicking so the dispatch loop can
/// log-and-skip malformed server output.
#[derive(Debug)]
pub enum DecodeError {
    /// Body is not valid JSON or does not match the expected shape
    Json(serde_json::Error),
    /// Body parsed but carries a payload the topic does not define
    UnexpectedPayload(String),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Json(err) => write!(f, "Invalid JSON: {}", err),
            DecodeError::UnexpectedPayload(what) => write!(f, "Unexpected payload: {}", what),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Json(err) => Some(err),
            DecodeError::UnexpectedPayload(_) => None,
        }
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::Json(err)
    }
}
