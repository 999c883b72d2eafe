//! Connection state machine
//!
//! Tracks the lifecycle of the shared transport session. The state is owned
//! exclusively by the `ConnectionManager`; every other component learns
//! session health through state-change notifications.

/// Connection lifecycle state
///
/// Transitions:
///
/// ```text
/// Disconnected --connect()-------> Connecting
/// Connecting   --server ack------> Connected
/// Connecting   --reject/timeout--> Errored
/// Connected    --network drop----> Disconnected
/// any state    --disconnect()----> Disconnected
/// ```
///
/// There is no automatic reconnection; recovering from `Disconnected` or
/// `Errored` is always caller-initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session, none being established
    Disconnected,
    /// Connect handshake in flight
    Connecting,
    /// Session established, sends allowed
    Connected,
    /// Handshake rejected or timed out
    Errored,
}

impl ConnectionState {
    /// Whether sends are currently allowed
    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Errored => "errored",
        };
        f.write_str(name)
    }
}
