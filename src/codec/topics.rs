//! Destination and topic naming
//!
//! Outbound actions are published to `/pub/...` destinations; server pushes
//! arrive on `/sub/...` topics.

/// Destination for joining the matchmaking queue
pub const QUEUE_JOIN: &str = "/pub/chat/queue/join";

/// Destination for leaving the matchmaking queue
pub const QUEUE_LEAVE: &str = "/pub/chat/queue/leave";

/// Destination for requesting a queue-status push
pub const QUEUE_STATUS: &str = "/pub/chat/queue/status";

/// Topic carrying server-pushed queue-status events
pub const QUEUE_TOPIC: &str = "/sub/chat/queue";

/// Prefix for per-room message topics
pub const ROOM_TOPIC_PREFIX: &str = "/sub/chat/room/";

/// Prefix for per-room publish destinations
pub const ROOM_DESTINATION_PREFIX: &str = "/pub/chat/room/";

/// Topic carrying one room's message stream
pub fn room_topic(room_id: &str) -> String {
    format!("{}{}", ROOM_TOPIC_PREFIX, room_id)
}

/// Publish destination for one room's chat actions
pub fn room_destination(room_id: &str) -> String {
    format!("{}{}", ROOM_DESTINATION_PREFIX, room_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_naming() {
        assert_eq!(room_topic("42"), "/sub/chat/room/42");
        assert_eq!(room_destination("42"), "/pub/chat/room/42");
    }
}
