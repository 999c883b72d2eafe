//! Room channel implementation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;

use crate::codec::topics;
use crate::codec::{ChatMessage, InboundEvent, OutboundAction};
use crate::connection::ConnectionManager;
use crate::error::{Error, Result};
use crate::registry::{SubscriptionHandle, SubscriptionRegistry};

/// The binding between a channel and one room's topic
#[derive(Debug, Clone)]
pub struct RoomBinding {
    /// Bound room identifier
    pub room_id: String,

    /// Topic the room's messages arrive on
    pub topic: String,

    handle: SubscriptionHandle,
}

impl RoomBinding {
    /// Handle of the room-topic subscription
    pub fn handle(&self) -> &SubscriptionHandle {
        &self.handle
    }
}

/// Live view of a single room's message stream
///
/// Accumulates an append-only log of [`ChatMessage`] events in arrival
/// order (out-of-order delivery is possible and not reordered here) and
/// exposes send/edit/delete actions. Sends are best effort while connected:
/// when the connection is down they fail without queuing or retrying.
pub struct RoomChannel {
    manager: Arc<ConnectionManager>,
    registry: Arc<SubscriptionRegistry>,
    sender_id: String,
    binding: Mutex<Option<RoomBinding>>,
    messages: Arc<RwLock<Vec<ChatMessage>>>,
    connected: Arc<AtomicBool>,
}

impl RoomChannel {
    /// Create a channel over the shared connection
    ///
    /// The channel registers a state listener so
    /// [`is_connected`](RoomChannel::is_connected) tracks the connection
    /// from construction onward.
    pub fn new(manager: Arc<ConnectionManager>, registry: Arc<SubscriptionRegistry>) -> Self {
        let connected = Arc::new(AtomicBool::new(manager.state().is_connected()));
        let flag = Arc::clone(&connected);
        manager.on_state_change(move |state| {
            flag.store(state.is_connected(), Ordering::SeqCst);
        });

        Self {
            sender_id: manager.config().sender_id.clone(),
            manager,
            registry,
            binding: Mutex::new(None),
            messages: Arc::new(RwLock::new(Vec::new())),
            connected,
        }
    }

    /// Bind to a room's message stream
    ///
    /// Any previous binding is released and its log cleared before the
    /// connection is touched: the old room's subscription is gone before
    /// the new one exists, so no event from the old topic can reach the
    /// new room's log, and a failed implicit connect never leaves the old
    /// room's messages visible. Connects implicitly (with the configured
    /// token) when the connection is down.
    pub async fn bind(&self, room_id: &str) -> Result<()> {
        self.unbind();
        self.messages.write().unwrap().clear();

        let state = self.manager.ensure_connected().await?;
        if !state.is_connected() {
            return Err(Error::NotConnected);
        }

        let topic = topics::room_topic(room_id);
        let messages = Arc::clone(&self.messages);
        let handle = self.registry.subscribe(&topic, move |event| match event {
            InboundEvent::Chat(message) => messages.write().unwrap().push(message),
            InboundEvent::Raw { destination, .. } => {
                tracing::debug!(topic = %destination, "Undecodable room frame ignored");
            }
            InboundEvent::Queue(_) => {
                tracing::debug!("Queue event on room topic ignored");
            }
        })?;

        *self.binding.lock().unwrap() = Some(RoomBinding {
            room_id: room_id.to_string(),
            topic,
            handle,
        });

        tracing::info!(room = %room_id, "Room bound");
        Ok(())
    }

    /// Release the current room binding
    ///
    /// Idempotent; safe to call from a dispose hook regardless of state.
    pub fn unbind(&self) {
        if let Some(binding) = self.binding.lock().unwrap().take() {
            self.registry.unsubscribe(&binding.topic);
            tracing::info!(room = %binding.room_id, "Room unbound");
        }
    }

    /// Send a message to the bound room
    ///
    /// Stamps the configured sender and the current time (RFC 3339).
    pub fn send_message(&self, content: &str) -> Result<()> {
        let room_id = self.bound_room().ok_or(Error::NotConnected)?;
        self.manager.send(
            &topics::room_destination(&room_id),
            &OutboundAction::Message {
                content: content.to_string(),
                timestamp: Utc::now().to_rfc3339(),
                sender: self.sender_id.clone(),
            },
        )
    }

    /// Replace the content of a previously sent message
    pub fn edit_message(&self, message_id: &str, content: &str) -> Result<()> {
        let room_id = self.bound_room().ok_or(Error::NotConnected)?;
        self.manager.send(
            &topics::room_destination(&room_id),
            &OutboundAction::Edit {
                message_id: message_id.to_string(),
                content: content.to_string(),
            },
        )
    }

    /// Delete a previously sent message
    pub fn delete_message(&self, message_id: &str) -> Result<()> {
        let room_id = self.bound_room().ok_or(Error::NotConnected)?;
        self.manager.send(
            &topics::room_destination(&room_id),
            &OutboundAction::Delete {
                message_id: message_id.to_string(),
            },
        )
    }

    /// Snapshot of the accumulated message log, in arrival order
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages.read().unwrap().clone()
    }

    /// Whether the shared connection is currently up
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Identifier of the currently bound room, if any
    pub fn room_id(&self) -> Option<String> {
        self.bound_room()
    }

    fn bound_room(&self) -> Option<String> {
        self.binding
            .lock()
            .unwrap()
            .as_ref()
            .map(|binding| binding.room_id.clone())
    }
}
