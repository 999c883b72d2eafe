//! Outbound action payloads
//!
//! Every chat action a client can publish, serialized with a `"type"` tag
//! and camelCase field names to match the server's wire format.

use serde::Serialize;

/// An application-level action to be encoded and published
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum OutboundAction {
    /// Send a chat message to the bound room
    #[serde(rename = "message", rename_all = "camelCase")]
    Message {
        /// Message text
        content: String,
        /// Client-side creation time, RFC 3339
        timestamp: String,
        /// Sender identifier
        sender: String,
    },

    /// Delete a previously sent message
    #[serde(rename = "delete", rename_all = "camelCase")]
    Delete {
        /// Identifier of the message to delete
        message_id: String,
    },

    /// Replace the content of a previously sent message
    #[serde(rename = "edit", rename_all = "camelCase")]
    Edit {
        /// Identifier of the message to edit
        message_id: String,
        /// Replacement text
        content: String,
    },

    /// Enter the matchmaking queue
    #[serde(rename = "JOIN_QUEUE", rename_all = "camelCase")]
    JoinQueue {
        /// Member identifier
        member_id: u64,
        /// Display name shown to other waiting members
        nickname: String,
    },

    /// Leave the matchmaking queue
    #[serde(rename = "LEAVE_QUEUE", rename_all = "camelCase")]
    LeaveQueue {
        /// Member identifier
        member_id: u64,
    },

    /// Ask the server to push a fresh queue-status event
    ///
    /// Encodes to `{}` on the wire; the destination alone identifies it.
    #[serde(rename = "STATUS_QUERY")]
    StatusQuery,
}
