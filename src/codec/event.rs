//! Inbound event types
//!
//! Typed views of the JSON payloads the server pushes on subscribed topics.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A decoded server push, routed to the subscribing callback
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// A room-topic chat event (message, edit or delete)
    Chat(ChatMessage),

    /// A queue-topic event (status snapshot or match placement)
    Queue(QueueEvent),

    /// A frame whose body could not be decoded; the raw body is passed
    /// through so malformed-but-present server output is still delivered
    Raw {
        /// Topic the frame arrived on
        destination: String,
        /// Unparsed body
        body: Bytes,
    },
}

/// Kind of chat event carried by a room frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// A new message
    Message,
    /// An edit of an existing message
    Edit,
    /// A deletion of an existing message
    Delete,
}

/// A single chat event on a room's message stream
///
/// Transient and UI-facing; this layer appends events in arrival order and
/// never persists them. Fields other than `kind` are optional because edits
/// and deletes carry only a subset of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// What this event does to the room's log
    #[serde(rename = "type")]
    pub kind: MessageKind,

    /// Server-assigned message identifier
    #[serde(default, alias = "messageId")]
    pub id: Option<String>,

    /// Room the message belongs to
    #[serde(default)]
    pub room_id: Option<String>,

    /// Sender identifier
    #[serde(default, alias = "sender")]
    pub sender_id: Option<String>,

    /// Message text
    #[serde(default)]
    pub content: Option<String>,

    /// Creation time as reported by the sender or server
    #[serde(default, alias = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A server push on the queue-status topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QueueEvent {
    /// Snapshot of the members currently waiting in the queue
    #[serde(rename = "QUEUE_STATUS", rename_all = "camelCase")]
    Status {
        /// Waiting members, in server order
        #[serde(default)]
        members: Vec<QueueMembership>,
    },

    /// The client has been placed into a room
    #[serde(rename = "MATCHED", rename_all = "camelCase")]
    Matched {
        /// Room the client was matched into
        room_id: String,
    },
}

/// One client's presence in the matchmaking queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMembership {
    /// Member identifier
    pub member_id: u64,

    /// Display name
    pub nickname: String,

    /// When the member joined the queue
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
}
