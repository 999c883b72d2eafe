//! Connection manager
//!
//! Owns the transport session and is the sole mutator of
//! [`ConnectionState`]. All connects and disconnects flow through here, so
//! two components can never race to open duplicate connections.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::mpsc;

use crate::codec::{self, OutboundAction, WireFrame};
use crate::error::{Error, Result};
use crate::registry::SubscriptionRegistry;
use crate::transport::{ConnectHeaders, SessionHandle, Transport};

use super::config::ClientConfig;
use super::state::ConnectionState;

type StateListener = Box<dyn Fn(ConnectionState) + Send + Sync>;

/// Owns the shared transport session
///
/// Constructed once and dependency-injected into `QueueClient` and every
/// `RoomChannel`. Expected failure modes (rejected handshake, network drop)
/// surface as state transitions rather than errors, so consumers branch on
/// state instead of catching exceptions.
pub struct ConnectionManager {
    transport: Arc<dyn Transport>,
    registry: Arc<SubscriptionRegistry>,
    config: ClientConfig,

    /// Current state; written only by this manager
    state: RwLock<ConnectionState>,

    /// State-change listeners, invoked on every transition
    listeners: RwLock<Vec<StateListener>>,

    /// Command handle of the live session, if any
    session: Mutex<Option<SessionHandle>>,

    /// Bumped on every connect/disconnect; a dispatch loop whose
    /// generation is stale must not mutate state
    generation: AtomicU64,
}

impl ConnectionManager {
    /// Create a manager over the given transport and registry
    pub fn new(
        transport: Arc<dyn Transport>,
        registry: Arc<SubscriptionRegistry>,
        config: ClientConfig,
    ) -> Self {
        Self {
            transport,
            registry,
            config,
            state: RwLock::new(ConnectionState::Disconnected),
            listeners: RwLock::new(Vec::new()),
            session: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state.read().unwrap()
    }

    /// The configuration this manager was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Register a listener invoked on every state transition
    ///
    /// Multiple listeners are allowed; the manager is a shared resource.
    /// Listeners cannot be removed and live as long as the manager, so
    /// register one per long-lived component rather than per short-lived
    /// handle.
    pub fn on_state_change(&self, listener: impl Fn(ConnectionState) + Send + Sync + 'static) {
        self.listeners.write().unwrap().push(Box::new(listener));
    }

    /// Establish the transport session
    ///
    /// Requires a non-empty token; otherwise fails with
    /// [`Error::AuthMissing`] before any network attempt. A rejected or
    /// timed-out handshake transitions to `Errored` and resolves with that
    /// state rather than an error. Connecting while already connected (or
    /// mid-handshake) returns the current state unchanged.
    pub async fn connect(self: &Arc<Self>, token: &str) -> Result<ConnectionState> {
        if token.trim().is_empty() {
            return Err(Error::AuthMissing);
        }

        let current = self.state();
        if matches!(
            current,
            ConnectionState::Connected | ConnectionState::Connecting
        ) {
            return Ok(current);
        }

        self.set_state(ConnectionState::Connecting);
        let headers = ConnectHeaders::bearer(token);
        let attempt =
            tokio::time::timeout(self.config.connect_timeout, self.transport.connect(headers));

        match attempt.await {
            Ok(Ok(mut session)) => {
                let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                let handle = session.handle();
                let incoming = session.take_incoming();

                *self.session.lock().unwrap() = Some(handle.clone());
                self.registry.attach(handle);
                if let Some(incoming) = incoming {
                    self.spawn_dispatch(incoming, generation);
                }

                tracing::info!(endpoint = %self.config.endpoint(), "Connected");
                self.set_state(ConnectionState::Connected);
                Ok(ConnectionState::Connected)
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "Connect rejected");
                self.set_state(ConnectionState::Errored);
                Ok(ConnectionState::Errored)
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.connect_timeout.as_millis() as u64,
                    "Connect timed out"
                );
                self.set_state(ConnectionState::Errored);
                Ok(ConnectionState::Errored)
            }
        }
    }

    /// Connect with the configured token unless already connected
    pub async fn ensure_connected(self: &Arc<Self>) -> Result<ConnectionState> {
        if self.state().is_connected() {
            return Ok(ConnectionState::Connected);
        }
        let token = self.config.auth_token.clone();
        self.connect(&token).await
    }

    /// Tear the session down
    ///
    /// Releases the transport first, then has the registry release every
    /// subscription: they must be considered dead before anything else
    /// touches the connection, so a late frame during teardown is dropped
    /// instead of dispatched against a half-closed session. Idempotent; a
    /// second call is a no-op and fires no notification.
    pub fn disconnect(&self) {
        let session = self.session.lock().unwrap().take();
        if session.is_none() && self.state() == ConnectionState::Disconnected {
            tracing::debug!("Disconnect ignored, already disconnected");
            return;
        }

        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = session {
            handle.close();
        }
        self.registry.unsubscribe_all();
        self.registry.detach();

        tracing::info!("Disconnected");
        self.set_state(ConnectionState::Disconnected);
    }

    /// Encode `action` and write it to `destination`
    ///
    /// Fails with [`Error::NotConnected`] unless the state is `Connected`;
    /// the caller observes the failure and decides whether to retry or
    /// surface it.
    pub fn send(&self, destination: &str, action: &OutboundAction) -> Result<()> {
        if !self.state().is_connected() {
            return Err(Error::NotConnected);
        }

        let frame = codec::encode(destination, action)?;
        let session = self
            .session
            .lock()
            .unwrap()
            .clone()
            .ok_or(Error::NotConnected)?;
        session.send(frame)
    }

    fn set_state(&self, next: ConnectionState) {
        {
            let mut state = self.state.write().unwrap();
            if *state == next {
                return;
            }
            *state = next;
        }
        tracing::debug!(state = %next, "Connection state changed");

        let listeners = self.listeners.read().unwrap();
        for listener in listeners.iter() {
            listener(next);
        }
    }

    /// Run the inbound dispatch loop for one session
    ///
    /// When the stream ends and this generation is still current, the drop
    /// came from the network or the server: tear down like an explicit
    /// disconnect (the dead session's subscriptions are released too, so a
    /// later reconnect starts from an empty registry), then transition to
    /// `Disconnected` and notify. No automatic reconnect.
    fn spawn_dispatch(
        self: &Arc<Self>,
        mut incoming: mpsc::UnboundedReceiver<WireFrame>,
        generation: u64,
    ) {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(frame) = incoming.recv().await {
                manager.registry.dispatch(&frame);
            }

            if manager.generation.load(Ordering::SeqCst) == generation
                && manager.state().is_connected()
            {
                tracing::info!("Transport dropped");
                manager.session.lock().unwrap().take();
                manager.registry.unsubscribe_all();
                manager.registry.detach();
                manager.set_state(ConnectionState::Disconnected);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::transport::{LocalServer, LocalTransport};
    use tokio_test::assert_ok;

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    fn manager_with(config: ClientConfig) -> (Arc<ConnectionManager>, LocalServer) {
        let (transport, server) = LocalTransport::pair();
        let registry = Arc::new(SubscriptionRegistry::new());
        let manager = Arc::new(ConnectionManager::new(
            Arc::new(transport),
            registry,
            config,
        ));
        (manager, server)
    }

    fn manager() -> (Arc<ConnectionManager>, LocalServer) {
        manager_with(ClientConfig::new("https://chat.example.com/").auth_token("tok123"))
    }

    #[tokio::test]
    async fn test_connect_requires_token() {
        let (manager, server) = manager();

        let result = manager.connect("").await;
        assert!(matches!(result, Err(Error::AuthMissing)));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        // Failed fast, no network attempt.
        assert_eq!(server.connect_attempts(), 0);
    }

    #[tokio::test]
    async fn test_connect_success() {
        let (manager, server) = manager();

        let state = tokio_test::assert_ok!(manager.connect("tok123").await);
        assert_eq!(state, ConnectionState::Connected);
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(
            server.last_authorization().as_deref(),
            Some("Bearer tok123")
        );
    }

    #[tokio::test]
    async fn test_connect_rejection_resolves_with_errored() {
        let (manager, server) = manager();
        server.reject_next_connect();

        let state = manager.connect("tok123").await.unwrap();
        assert_eq!(state, ConnectionState::Errored);
        assert_eq!(manager.state(), ConnectionState::Errored);

        // Reconnection is caller-initiated and allowed from Errored.
        let state = manager.connect("tok123").await.unwrap();
        assert_eq!(state, ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_connect_timeout_resolves_with_errored() {
        let (manager, server) = manager_with(
            ClientConfig::new("https://chat.example.com/")
                .auth_token("tok123")
                .connect_timeout(Duration::from_millis(20)),
        );
        server.hang_next_connect();

        let state = manager.connect("tok123").await.unwrap();
        assert_eq!(state, ConnectionState::Errored);
    }

    #[tokio::test]
    async fn test_connect_while_connected_is_noop() {
        let (manager, server) = manager();

        manager.connect("tok123").await.unwrap();
        let state = manager.connect("tok123").await.unwrap();

        assert_eq!(state, ConnectionState::Connected);
        assert_eq!(server.connect_attempts(), 1);
    }

    #[tokio::test]
    async fn test_send_requires_connected_state() {
        let (manager, server) = manager();

        let result = manager.send(
            "/pub/chat/queue/status",
            &OutboundAction::StatusQuery,
        );
        assert!(matches!(result, Err(Error::NotConnected)));
        assert!(server.sent().is_empty());

        manager.connect("tok123").await.unwrap();
        manager
            .send("/pub/chat/queue/status", &OutboundAction::StatusQuery)
            .unwrap();
        settle().await;
        assert_eq!(server.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_twice_is_noop() {
        let (manager, server) = manager();
        manager.connect("tok123").await.unwrap();

        let transitions = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&transitions);
        manager.on_state_change(move |state| seen.lock().unwrap().push(state));

        manager.disconnect();
        manager.disconnect();
        settle().await;

        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(!server.is_connected());
        // Exactly one transition observed; the second call fired nothing.
        assert_eq!(
            *transitions.lock().unwrap(),
            vec![ConnectionState::Disconnected]
        );
    }

    #[tokio::test]
    async fn test_disconnect_releases_subscriptions() {
        let (transport, server) = LocalTransport::pair();
        let registry = Arc::new(SubscriptionRegistry::new());
        let manager = Arc::new(ConnectionManager::new(
            Arc::new(transport),
            Arc::clone(&registry),
            ClientConfig::new("https://chat.example.com/").auth_token("tok123"),
        ));

        manager.connect("tok123").await.unwrap();
        registry.subscribe("/sub/chat/queue", |_| {}).unwrap();
        registry.subscribe("/sub/chat/room/1", |_| {}).unwrap();
        settle().await;
        assert_eq!(server.subscription_count(), 2);

        manager.disconnect();
        settle().await;

        assert_eq!(registry.len(), 0);
        assert_eq!(server.subscription_count(), 0);
    }

    #[tokio::test]
    async fn test_network_drop_transitions_to_disconnected() {
        let (manager, server) = manager();
        manager.connect("tok123").await.unwrap();

        let transitions = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&transitions);
        manager.on_state_change(move |state| seen.lock().unwrap().push(state));

        server.drop_connection();
        settle().await;

        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert_eq!(
            *transitions.lock().unwrap(),
            vec![ConnectionState::Disconnected]
        );
    }

    #[tokio::test]
    async fn test_network_drop_releases_subscriptions() {
        let (transport, server) = LocalTransport::pair();
        let registry = Arc::new(SubscriptionRegistry::new());
        let manager = Arc::new(ConnectionManager::new(
            Arc::new(transport),
            Arc::clone(&registry),
            ClientConfig::new("https://chat.example.com/").auth_token("tok123"),
        ));

        manager.connect("tok123").await.unwrap();
        registry.subscribe("/sub/chat/room/1", |_| {}).unwrap();
        settle().await;
        assert!(registry.contains("/sub/chat/room/1"));

        server.drop_connection();
        settle().await;

        // The dead session's entries do not survive into the next connect.
        assert_eq!(registry.len(), 0);
        manager.connect("tok123").await.unwrap();
        assert!(!registry.contains("/sub/chat/room/1"));
    }

    #[tokio::test]
    async fn test_state_listeners_see_full_lifecycle() {
        let (manager, _server) = manager();

        let transitions = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&transitions);
        manager.on_state_change(move |state| seen.lock().unwrap().push(state));

        manager.connect("tok123").await.unwrap();
        manager.disconnect();

        assert_eq!(
            *transitions.lock().unwrap(),
            vec![
                ConnectionState::Connecting,
                ConnectionState::Connected,
                ConnectionState::Disconnected,
            ]
        );
    }

    #[tokio::test]
    async fn test_inbound_frames_reach_registry() {
        let (transport, server) = LocalTransport::pair();
        let registry = Arc::new(SubscriptionRegistry::new());
        let manager = Arc::new(ConnectionManager::new(
            Arc::new(transport),
            Arc::clone(&registry),
            ClientConfig::new("https://chat.example.com/").auth_token("tok123"),
        ));

        manager.connect("tok123").await.unwrap();

        let hits = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&hits);
        registry
            .subscribe("/sub/chat/queue", move |event| {
                seen.lock().unwrap().push(format!("{:?}", event));
            })
            .unwrap();
        settle().await;

        assert!(server.push("/sub/chat/queue", r#"{"type":"QUEUE_STATUS"}"#));
        settle().await;

        assert_eq!(hits.lock().unwrap().len(), 1);
    }
}
