//! Queue client implementation

use std::sync::{Arc, RwLock};

use crate::codec::topics;
use crate::codec::{InboundEvent, OutboundAction, QueueEvent, QueueMembership};
use crate::connection::ConnectionManager;
use crate::error::{Error, Result};
use crate::registry::SubscriptionRegistry;

type QueueListener = Box<dyn Fn(&QueueEvent) + Send + Sync>;

/// Client for the matchmaking-queue protocol
///
/// Status responses are never returned synchronously: `status()` is
/// fire-and-forget and the answer arrives on the subscribed queue topic,
/// where it updates the mirrored [`members`](QueueClient::members) snapshot
/// and fans out to registered listeners.
pub struct QueueClient {
    manager: Arc<ConnectionManager>,
    registry: Arc<SubscriptionRegistry>,
    members: Arc<RwLock<Vec<QueueMembership>>>,
    listeners: Arc<RwLock<Vec<QueueListener>>>,
}

impl QueueClient {
    /// Create a queue client over the shared connection
    pub fn new(manager: Arc<ConnectionManager>, registry: Arc<SubscriptionRegistry>) -> Self {
        Self {
            manager,
            registry,
            members: Arc::new(RwLock::new(Vec::new())),
            listeners: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register a listener invoked on every queue event
    pub fn on_queue_event(&self, listener: impl Fn(&QueueEvent) + Send + Sync + 'static) {
        self.listeners.write().unwrap().push(Box::new(listener));
    }

    /// Join the matchmaking queue
    ///
    /// Connects first (with the configured token) if the connection is not
    /// already up. Subscribes to the queue-status topic before publishing
    /// the join so no push is missed; the registry's replace rule keeps the
    /// subscription singular when `join` is called repeatedly.
    pub async fn join(&self, member_id: u64, nickname: &str) -> Result<()> {
        let state = self.manager.ensure_connected().await?;
        if !state.is_connected() {
            return Err(Error::NotConnected);
        }

        self.subscribe_status()?;
        self.manager.send(
            topics::QUEUE_JOIN,
            &OutboundAction::JoinQueue {
                member_id,
                nickname: nickname.to_string(),
            },
        )?;

        tracing::info!(member_id = member_id, nickname = %nickname, "Joined queue");
        Ok(())
    }

    /// Leave the matchmaking queue
    ///
    /// The status subscription is deliberately kept: it stays informative
    /// (re-matching, queue movement) until [`close`](QueueClient::close).
    pub fn leave(&self, member_id: u64) -> Result<()> {
        self.manager
            .send(topics::QUEUE_LEAVE, &OutboundAction::LeaveQueue { member_id })?;
        tracing::info!(member_id = member_id, "Left queue");
        Ok(())
    }

    /// Request a fresh queue-status push
    pub fn status(&self) -> Result<()> {
        self.manager
            .send(topics::QUEUE_STATUS, &OutboundAction::StatusQuery)
    }

    /// Most recent server-reported queue membership
    pub fn members(&self) -> Vec<QueueMembership> {
        self.members.read().unwrap().clone()
    }

    /// Tear the client down, releasing the status subscription
    pub fn close(&self) {
        self.registry.unsubscribe(topics::QUEUE_TOPIC);
    }

    fn subscribe_status(&self) -> Result<()> {
        let members = Arc::clone(&self.members);
        let listeners = Arc::clone(&self.listeners);

        self.registry.subscribe(topics::QUEUE_TOPIC, move |event| {
            let queue_event = match event {
                InboundEvent::Queue(event) => event,
                InboundEvent::Raw { .. } => {
                    tracing::debug!("Undecodable queue frame ignored");
                    return;
                }
                InboundEvent::Chat(_) => {
                    tracing::debug!("Chat event on queue topic ignored");
                    return;
                }
            };

            if let QueueEvent::Status { members: next } = &queue_event {
                *members.write().unwrap() = next.clone();
            }

            for listener in listeners.read().unwrap().iter() {
                listener(&queue_event);
            }
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::connection::{ClientConfig, ConnectionState};
    use crate::transport::{LocalServer, LocalTransport};

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    fn setup() -> (QueueClient, Arc<ConnectionManager>, LocalServer) {
        let (transport, server) = LocalTransport::pair();
        let registry = Arc::new(SubscriptionRegistry::new());
        let manager = Arc::new(ConnectionManager::new(
            Arc::new(transport),
            Arc::clone(&registry),
            ClientConfig::new("https://chat.example.com/").auth_token("tok123"),
        ));
        let client = QueueClient::new(Arc::clone(&manager), registry);
        (client, manager, server)
    }

    #[tokio::test]
    async fn test_join_connects_implicitly() {
        let (client, manager, server) = setup();

        client.join(7, "guest").await.unwrap();
        settle().await;

        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(server.topics(), vec![topics::QUEUE_TOPIC.to_string()]);

        let joins = server.sent_to(topics::QUEUE_JOIN);
        assert_eq!(joins.len(), 1);
        let value: serde_json::Value = serde_json::from_slice(&joins[0].body).unwrap();
        assert_eq!(value["type"], "JOIN_QUEUE");
        assert_eq!(value["memberId"], 7);
        assert_eq!(value["nickname"], "guest");
    }

    #[tokio::test]
    async fn test_join_twice_keeps_single_subscription() {
        let (client, _manager, server) = setup();

        client.join(7, "guest").await.unwrap();
        client.join(7, "guest").await.unwrap();
        settle().await;

        assert_eq!(server.subscription_count(), 1);
        assert_eq!(server.sent_to(topics::QUEUE_JOIN).len(), 2);
    }

    #[tokio::test]
    async fn test_leave_keeps_status_subscription() {
        let (client, _manager, server) = setup();

        client.join(7, "guest").await.unwrap();
        client.leave(7).unwrap();
        settle().await;

        assert_eq!(server.sent_to(topics::QUEUE_LEAVE).len(), 1);
        // Leaving does not tear the status topic down.
        assert_eq!(server.topics(), vec![topics::QUEUE_TOPIC.to_string()]);
    }

    #[tokio::test]
    async fn test_status_is_fire_and_forget() {
        let (client, _manager, server) = setup();
        client.join(7, "guest").await.unwrap();

        client.status().unwrap();
        settle().await;

        let queries = server.sent_to(topics::QUEUE_STATUS);
        assert_eq!(queries.len(), 1);
        assert_eq!(&queries[0].body[..], b"{}");
    }

    #[tokio::test]
    async fn test_send_failures_surface_as_results() {
        let (client, _manager, _server) = setup();

        // Not connected yet: expected failure, not a panic.
        assert!(matches!(client.leave(7), Err(Error::NotConnected)));
        assert!(matches!(client.status(), Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn test_status_push_updates_members_and_listeners() {
        let (client, _manager, server) = setup();

        let events = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&events);
        client.on_queue_event(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        client.join(7, "guest").await.unwrap();
        settle().await;

        server.push(
            topics::QUEUE_TOPIC,
            r#"{"type":"QUEUE_STATUS","members":[{"memberId":7,"nickname":"guest"}]}"#,
        );
        settle().await;

        let members = client.members();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].member_id, 7);
        assert_eq!(events.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_matched_event_reaches_listeners() {
        let (client, _manager, server) = setup();

        let matched_room = Arc::new(RwLock::new(None));
        let seen = Arc::clone(&matched_room);
        client.on_queue_event(move |event| {
            if let QueueEvent::Matched { room_id } = event {
                *seen.write().unwrap() = Some(room_id.clone());
            }
        });

        client.join(7, "guest").await.unwrap();
        settle().await;

        server.push(topics::QUEUE_TOPIC, r#"{"type":"MATCHED","roomId":"42"}"#);
        settle().await;

        assert_eq!(matched_room.read().unwrap().as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn test_close_releases_status_subscription() {
        let (client, _manager, server) = setup();

        client.join(7, "guest").await.unwrap();
        settle().await;
        assert_eq!(server.subscription_count(), 1);

        client.close();
        settle().await;
        assert_eq!(server.subscription_count(), 0);
    }
}
