//! Realtime chat transport client
//!
//! Client-side transport layer for a matchmaking-style chat service:
//! maintains a persistent messaging connection, joins/leaves the
//! matchmaking queue, subscribes to message topics, and routes inbound
//! frames to application callbacks.
//!
//! # Architecture
//!
//! ```text
//!   [RoomChannel]   [QueueClient]
//!        │                │
//!        ├────────────────┤
//!        ▼                ▼
//!   ConnectionManager ── SubscriptionRegistry
//!        │                │
//!        ▼                ▼
//!       Transport (STOMP/SockJS or in-process)
//!        ▲                ▲
//!        └── FrameCodec ──┘
//! ```
//!
//! The `ConnectionManager` is the sole mutator of [`ConnectionState`]; the
//! `SubscriptionRegistry` is the sole mutator of the topic → subscription
//! map. Both are constructed once and shared by every consumer, so all
//! lifecycle flows through one place. There is no automatic reconnection:
//! a drop surfaces as a state change and recovery is caller-initiated.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use matchchat_rs::transport::LocalTransport;
//! use matchchat_rs::{ClientConfig, ConnectionManager, RoomChannel, SubscriptionRegistry};
//!
//! # async fn example() -> matchchat_rs::Result<()> {
//! let (transport, _server) = LocalTransport::pair();
//! let registry = Arc::new(SubscriptionRegistry::new());
//! let config = ClientConfig::new("https://chat.example.com/").auth_token("tok123");
//! let manager = Arc::new(ConnectionManager::new(
//!     Arc::new(transport),
//!     Arc::clone(&registry),
//!     config,
//! ));
//!
//! manager.connect("tok123").await?;
//!
//! let room = RoomChannel::new(Arc::clone(&manager), Arc::clone(&registry));
//! room.bind("42").await?;
//! room.send_message("hello")?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod connection;
pub mod error;
pub mod queue;
pub mod registry;
pub mod room;
pub mod transport;

pub use codec::{
    ChatMessage, InboundEvent, MessageKind, OutboundAction, QueueEvent, QueueMembership, WireFrame,
};
pub use connection::{ClientConfig, ConnectionManager, ConnectionState};
pub use error::{DecodeError, Error, Result};
pub use queue::QueueClient;
pub use registry::{SubscriptionHandle, SubscriptionRegistry};
pub use room::{RoomBinding, RoomChannel};
