//! In-process transport
//!
//! A channel-backed [`Transport`] with a [`LocalServer`] peer that plays the
//! chat server's role: it records published frames, tracks the live topic
//! set, and injects inbound frames. Used by the crate's own tests and by
//! consumers embedding a fake server.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::codec::WireFrame;
use crate::error::{Error, Result};

use super::{ConnectHeaders, Transport, TransportCommand, TransportSession};

#[derive(Default)]
struct ServerState {
    sent: Vec<WireFrame>,
    topics: HashSet<String>,
    inbound: Option<mpsc::UnboundedSender<WireFrame>>,
    headers: Vec<ConnectHeaders>,
    connect_attempts: usize,
    reject_next_connect: bool,
    hang_next_connect: bool,
}

/// In-process transport backed by tokio channels
///
/// Create a connected pair with [`LocalTransport::pair`].
pub struct LocalTransport {
    state: Arc<Mutex<ServerState>>,
}

impl LocalTransport {
    /// Create a transport and the server-side handle observing it
    pub fn pair() -> (LocalTransport, LocalServer) {
        let state = Arc::new(Mutex::new(ServerState::default()));
        (
            LocalTransport {
                state: Arc::clone(&state),
            },
            LocalServer { state },
        )
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn connect(&self, headers: ConnectHeaders) -> Result<TransportSession> {
        let hang = {
            let mut state = self.state.lock().unwrap();
            state.connect_attempts += 1;

            if state.hang_next_connect {
                state.hang_next_connect = false;
                true
            } else if state.reject_next_connect {
                state.reject_next_connect = false;
                return Err(Error::ConnectFailed("rejected by server".to_string()));
            } else {
                false
            }
        };

        if hang {
            // Never acknowledges; the caller's timeout fires.
            return std::future::pending().await;
        }

        let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();

        {
            let mut state = self.state.lock().unwrap();
            state.headers.push(headers);
            state.inbound = Some(in_tx);
            state.topics.clear();
        }

        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            while let Some(command) = cmd_rx.recv().await {
                let mut server = state.lock().unwrap();
                match command {
                    TransportCommand::Send(frame) => server.sent.push(frame),
                    TransportCommand::Subscribe(topic) => {
                        server.topics.insert(topic);
                    }
                    TransportCommand::Unsubscribe(topic) => {
                        server.topics.remove(&topic);
                    }
                    TransportCommand::Close => {
                        server.inbound = None;
                        server.topics.clear();
                        break;
                    }
                }
            }
        });

        Ok(TransportSession::new(cmd_tx, in_rx))
    }
}

/// Server-side handle for a [`LocalTransport`]
///
/// Lets tests and demos observe outbound traffic and push inbound frames.
pub struct LocalServer {
    state: Arc<Mutex<ServerState>>,
}

impl LocalServer {
    /// Push an inbound frame for `topic`
    ///
    /// Delivered only if the client currently holds a subscription for the
    /// topic, mirroring server-side routing. Returns whether it was sent.
    pub fn push(&self, topic: &str, body: impl Into<Bytes>) -> bool {
        let state = self.state.lock().unwrap();
        if !state.topics.contains(topic) {
            return false;
        }
        match &state.inbound {
            Some(tx) => tx.send(WireFrame::new(topic, body)).is_ok(),
            None => false,
        }
    }

    /// All frames the client has published, in send order
    pub fn sent(&self) -> Vec<WireFrame> {
        self.state.lock().unwrap().sent.clone()
    }

    /// Published frames addressed to `destination`
    pub fn sent_to(&self, destination: &str) -> Vec<WireFrame> {
        self.state
            .lock()
            .unwrap()
            .sent
            .iter()
            .filter(|frame| frame.destination == destination)
            .cloned()
            .collect()
    }

    /// Currently subscribed topics
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.state.lock().unwrap().topics.iter().cloned().collect();
        topics.sort();
        topics
    }

    /// Number of live subscriptions
    pub fn subscription_count(&self) -> usize {
        self.state.lock().unwrap().topics.len()
    }

    /// Whether a session is currently open
    pub fn is_connected(&self) -> bool {
        self.state.lock().unwrap().inbound.is_some()
    }

    /// Number of connect attempts seen, including rejected ones
    pub fn connect_attempts(&self) -> usize {
        self.state.lock().unwrap().connect_attempts
    }

    /// `Authorization` header of the most recent accepted connect
    pub fn last_authorization(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .headers
            .last()
            .map(|h| h.authorization.clone())
    }

    /// Reject the next connect attempt
    pub fn reject_next_connect(&self) {
        self.state.lock().unwrap().reject_next_connect = true;
    }

    /// Leave the next connect attempt unanswered
    pub fn hang_next_connect(&self) {
        self.state.lock().unwrap().hang_next_connect = true;
    }

    /// Drop the connection without a close handshake, as a network
    /// failure would
    pub fn drop_connection(&self) {
        self.state.lock().unwrap().inbound = None;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use tokio_test::assert_ok;

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test]
    async fn test_send_and_subscribe_reach_server() {
        let (transport, server) = LocalTransport::pair();
        let session = transport
            .connect(ConnectHeaders::bearer("tok123"))
            .await
            .unwrap();
        let handle = session.handle();

        handle.subscribe("/sub/chat/queue").unwrap();
        handle.send(WireFrame::new("/pub/chat/queue/status", "{}")).unwrap();
        settle().await;

        assert_eq!(server.topics(), vec!["/sub/chat/queue".to_string()]);
        assert_eq!(server.sent().len(), 1);
        assert_eq!(server.last_authorization().as_deref(), Some("Bearer tok123"));
    }

    #[tokio::test]
    async fn test_push_requires_subscription() {
        let (transport, server) = LocalTransport::pair();
        let mut session = transport
            .connect(ConnectHeaders::bearer("tok123"))
            .await
            .unwrap();
        let handle = session.handle();
        let mut incoming = session.take_incoming().unwrap();

        assert!(!server.push("/sub/chat/queue", "{}"));

        handle.subscribe("/sub/chat/queue").unwrap();
        settle().await;

        assert!(server.push("/sub/chat/queue", r#"{"type":"QUEUE_STATUS"}"#));
        let frame = incoming.recv().await.unwrap();
        assert_eq!(frame.destination, "/sub/chat/queue");
    }

    #[tokio::test]
    async fn test_reject_next_connect() {
        let (transport, server) = LocalTransport::pair();
        server.reject_next_connect();

        let result = transport.connect(ConnectHeaders::bearer("tok123")).await;
        assert!(matches!(result, Err(Error::ConnectFailed(_))));
        assert_eq!(server.connect_attempts(), 1);

        // Only the one attempt is rejected.
        tokio_test::assert_ok!(transport.connect(ConnectHeaders::bearer("tok123")).await);
    }

    #[tokio::test]
    async fn test_close_ends_incoming_stream() {
        let (transport, server) = LocalTransport::pair();
        let mut session = transport
            .connect(ConnectHeaders::bearer("tok123"))
            .await
            .unwrap();
        let handle = session.handle();
        let mut incoming = session.take_incoming().unwrap();

        handle.subscribe("/sub/chat/queue").unwrap();
        settle().await;
        handle.close();
        settle().await;

        assert!(!server.is_connected());
        assert_eq!(server.subscription_count(), 0);
        assert!(incoming.recv().await.is_none());
    }
}
