//! Subscription registry for topic routing
//!
//! The registry is the sole owner of the topic → subscription map. It
//! enforces the one-live-subscription-per-topic rule, releases every
//! subscription exactly once at teardown, and routes inbound frames to the
//! currently active callback for their topic.
//!
//! ```text
//!                     SubscriptionRegistry
//!                ┌────────────────────────────┐
//!                │ subs: HashMap<Topic,       │
//!                │   { epoch, callback }      │
//!                │ >                          │
//!                │ link: SessionHandle        │
//!                └──────────┬─────────────────┘
//!                           │ dispatch(frame)
//!          ┌────────────────┼────────────────┐
//!          ▼                ▼                ▼
//!     [RoomChannel]    [QueueClient]    [consumer cb]
//! ```
//!
//! Unsubscribe acknowledgments are asynchronous at the transport level, so
//! each dispatch re-checks that the looked-up entry is still the active one
//! for its topic (an epoch check) before invoking application code.

pub mod store;
pub mod subscription;

pub use store::SubscriptionRegistry;
pub use subscription::{EventCallback, SubscriptionHandle};
