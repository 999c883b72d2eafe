//! Subscription entry types

use std::sync::Arc;

use crate::codec::InboundEvent;

/// Callback invoked with every event decoded on a subscribed topic
pub type EventCallback = Arc<dyn Fn(InboundEvent) + Send + Sync>;

/// Handle identifying one live subscription
///
/// Returned from [`SubscriptionRegistry::subscribe`] and usable for
/// explicit removal. A handle whose epoch has been superseded no longer
/// refers to anything.
///
/// [`SubscriptionRegistry::subscribe`]: super::SubscriptionRegistry::subscribe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
    /// Topic the subscription delivers
    pub topic: String,

    /// Registration epoch, unique per subscribe call
    pub(crate) epoch: u64,
}

/// One tracked subscription
pub(crate) struct SubscriptionEntry {
    /// Registration epoch; stale dispatches compare against this
    pub epoch: u64,

    /// Application callback
    pub callback: EventCallback,
}
