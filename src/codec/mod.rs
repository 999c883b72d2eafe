//! Frame codec for the chat wire protocol
//!
//! Translates between application-level actions/events and the JSON wire
//! frames exchanged over the transport. Encoding and decoding are pure:
//! no network access, no shared state, safe to call from any task.
//!
//! ```text
//!   OutboundAction ──encode()──► WireFrame ──► transport
//!   transport ──► WireFrame ──decode()──► InboundEvent
//! ```
//!
//! Bodies are carried as `bytes::Bytes`, so fanning a frame out to a
//! callback or passing a malformed body through raw only bumps a
//! reference count.

pub mod action;
pub mod event;
pub mod topics;

pub use action::OutboundAction;
pub use event::{ChatMessage, InboundEvent, MessageKind, QueueEvent, QueueMembership};

use bytes::Bytes;

use crate::error::{DecodeError, Result};

/// A single serialized unit exchanged over the transport connection
#[derive(Debug, Clone, PartialEq)]
pub struct WireFrame {
    /// Destination (outbound) or topic (inbound) this frame is addressed to
    pub destination: String,

    /// JSON body (reference-counted, cheap to clone)
    pub body: Bytes,
}

impl WireFrame {
    /// Create a new wire frame
    pub fn new(destination: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            destination: destination.into(),
            body: body.into(),
        }
    }
}

/// Encode an outbound action into a wire frame addressed to `destination`
///
/// `StatusQuery` encodes to the empty JSON object; every other action is
/// tagged with its `"type"` field.
pub fn encode(destination: &str, action: &OutboundAction) -> Result<WireFrame> {
    let body = match action {
        OutboundAction::StatusQuery => Bytes::from_static(b"{}"),
        other => Bytes::from(serde_json::to_vec(other).map_err(DecodeError::from)?),
    };

    Ok(WireFrame::new(destination, body))
}

/// Decode an inbound wire frame into a typed event
///
/// The topic selects the payload shape: the queue-status topic carries
/// [`QueueEvent`]s, everything else is treated as a room message stream.
/// Malformed payloads yield a [`DecodeError`] instead of panicking, so the
/// dispatch loop can log-and-skip without crashing.
pub fn decode(frame: &WireFrame) -> std::result::Result<InboundEvent, DecodeError> {
    if frame.body.is_empty() {
        return Err(DecodeError::UnexpectedPayload("empty body".to_string()));
    }

    if frame.destination == topics::QUEUE_TOPIC {
        let event: QueueEvent = serde_json::from_slice(&frame.body)?;
        Ok(InboundEvent::Queue(event))
    } else {
        let message: ChatMessage = serde_json::from_slice(&frame.body)?;
        Ok(InboundEvent::Chat(message))
    }
}
