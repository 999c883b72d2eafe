//! Transport abstraction
//!
//! The wire protocol itself (STOMP over SockJS in production) is a provided
//! capability, not something this crate implements. What this module defines
//! is the seam: a [`Transport`] opens an authenticated [`TransportSession`],
//! which is a command-channel handle to a background I/O task plus a stream
//! of inbound frames.
//!
//! ```text
//!   ConnectionManager ──TransportCommand──► transport task ──► wire
//!   wire ──► transport task ──WireFrame──► dispatch loop
//! ```

pub mod local;

pub use local::{LocalServer, LocalTransport};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::codec::WireFrame;
use crate::error::{Error, Result};

/// Headers presented during the connect handshake
#[derive(Debug, Clone)]
pub struct ConnectHeaders {
    /// `Authorization` header value
    pub authorization: String,
}

impl ConnectHeaders {
    /// Build headers carrying a bearer token
    pub fn bearer(token: &str) -> Self {
        Self {
            authorization: format!("Bearer {}", token),
        }
    }

    /// Extract the bearer token, if the header carries one
    pub fn token(&self) -> Option<&str> {
        self.authorization.strip_prefix("Bearer ")
    }
}

/// A factory for authenticated transport sessions
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a session against the remote endpoint
    ///
    /// Resolves once the handshake is acknowledged or rejected. Connection
    /// timeouts are enforced by the caller, not the transport.
    async fn connect(&self, headers: ConnectHeaders) -> Result<TransportSession>;
}

/// Commands accepted by a transport's background task
#[derive(Debug)]
pub enum TransportCommand {
    /// Write a frame to the wire
    Send(WireFrame),
    /// Start delivering frames for a topic
    Subscribe(String),
    /// Stop delivering frames for a topic
    Unsubscribe(String),
    /// Close the session
    Close,
}

/// A live transport session
///
/// Holds the command side and, until taken, the inbound frame receiver.
pub struct TransportSession {
    handle: SessionHandle,
    incoming: Option<mpsc::UnboundedReceiver<WireFrame>>,
}

impl TransportSession {
    /// Assemble a session from its two channel halves
    ///
    /// Transport implementations call this after spawning their I/O task.
    pub fn new(
        commands: mpsc::UnboundedSender<TransportCommand>,
        incoming: mpsc::UnboundedReceiver<WireFrame>,
    ) -> Self {
        Self {
            handle: SessionHandle { commands },
            incoming: Some(incoming),
        }
    }

    /// Get a cloneable command handle
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Take the inbound frame receiver
    ///
    /// Returns `None` on the second call; exactly one dispatch loop may
    /// own the stream.
    pub fn take_incoming(&mut self) -> Option<mpsc::UnboundedReceiver<WireFrame>> {
        self.incoming.take()
    }
}

/// Cloneable command handle to a transport session
///
/// All methods queue a command and return immediately; errors mean the
/// background task has gone away.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<TransportCommand>,
}

impl SessionHandle {
    /// Write a frame to the wire
    pub fn send(&self, frame: WireFrame) -> Result<()> {
        self.commands
            .send(TransportCommand::Send(frame))
            .map_err(|_| Error::TransportClosed)
    }

    /// Request delivery of frames for `topic`
    pub fn subscribe(&self, topic: &str) -> Result<()> {
        self.commands
            .send(TransportCommand::Subscribe(topic.to_string()))
            .map_err(|_| Error::SubscribeFailed {
                topic: topic.to_string(),
            })
    }

    /// Request removal of the subscription for `topic`
    ///
    /// The acknowledgment is asynchronous; frames already in flight may
    /// still arrive after this returns.
    pub fn unsubscribe(&self, topic: &str) -> Result<()> {
        self.commands
            .send(TransportCommand::Unsubscribe(topic.to_string()))
            .map_err(|_| Error::Unsubscribe {
                topic: topic.to_string(),
            })
    }

    /// Close the session
    ///
    /// Safe to call more than once; later commands are dropped.
    pub fn close(&self) {
        let _ = self.commands.send(TransportCommand::Close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_headers() {
        let headers = ConnectHeaders::bearer("tok123");
        assert_eq!(headers.authorization, "Bearer tok123");
        assert_eq!(headers.token(), Some("tok123"));
    }

    #[tokio::test]
    async fn test_handle_errors_after_task_gone() {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (_in_tx, in_rx) = mpsc::unbounded_channel();
        let session = TransportSession::new(cmd_tx, in_rx);
        let handle = session.handle();

        drop(cmd_rx);

        assert!(matches!(
            handle.send(WireFrame::new("/pub/x", "{}")),
            Err(Error::TransportClosed)
        ));
        assert!(matches!(
            handle.subscribe("/sub/x"),
            Err(Error::SubscribeFailed { .. })
        ));
        assert!(matches!(
            handle.unsubscribe("/sub/x"),
            Err(Error::Unsubscribe { .. })
        ));
    }

    #[tokio::test]
    async fn test_incoming_taken_once() {
        let (cmd_tx, _cmd_rx) = mpsc::unbounded_channel();
        let (_in_tx, in_rx) = mpsc::unbounded_channel();
        let mut session = TransportSession::new(cmd_tx, in_rx);

        assert!(session.take_incoming().is_some());
        assert!(session.take_incoming().is_none());
    }
}
