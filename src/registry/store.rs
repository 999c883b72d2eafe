//! Subscription registry implementation

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::codec::{self, InboundEvent, WireFrame};
use crate::error::{Error, Result};
use crate::transport::SessionHandle;

use super::subscription::{SubscriptionEntry, SubscriptionHandle};

struct Inner {
    /// Command link to the live transport session, if any
    link: Option<SessionHandle>,

    /// Map of topic to its single live subscription
    subs: HashMap<String, SubscriptionEntry>,

    /// Monotonic epoch counter; bumped on every subscribe
    next_epoch: u64,
}

/// Tracks active topic subscriptions and routes inbound frames
///
/// Constructed once and shared (dependency-injected) between the
/// `ConnectionManager`, `QueueClient` and every `RoomChannel`, rather than
/// living in ambient module state.
pub struct SubscriptionRegistry {
    inner: Mutex<Inner>,
}

impl SubscriptionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                link: None,
                subs: HashMap::new(),
                next_epoch: 0,
            }),
        }
    }

    /// Attach the command link of a freshly opened session
    pub(crate) fn attach(&self, link: SessionHandle) {
        self.inner.lock().unwrap().link = Some(link);
    }

    /// Drop the command link after the session is gone
    pub(crate) fn detach(&self) {
        self.inner.lock().unwrap().link = None;
    }

    /// Subscribe `callback` to `topic`
    ///
    /// If the topic already has a live subscription it is unsubscribed
    /// first, so at most one exists per topic and only the most recent
    /// callback receives subsequent events.
    pub fn subscribe(
        &self,
        topic: &str,
        callback: impl Fn(InboundEvent) + Send + Sync + 'static,
    ) -> Result<SubscriptionHandle> {
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;

        if inner.subs.remove(topic).is_some() {
            tracing::debug!(topic = %topic, "Replacing existing subscription");
            Self::release(&inner.link, topic);
        }

        let link = inner.link.clone().ok_or_else(|| Error::SubscribeFailed {
            topic: topic.to_string(),
        })?;
        link.subscribe(topic)?;

        inner.next_epoch += 1;
        let epoch = inner.next_epoch;
        inner.subs.insert(
            topic.to_string(),
            SubscriptionEntry {
                epoch,
                callback: Arc::new(callback),
            },
        );

        tracing::info!(
            topic = %topic,
            subscriptions = inner.subs.len(),
            "Subscriber added"
        );

        Ok(SubscriptionHandle {
            topic: topic.to_string(),
            epoch,
        })
    }

    /// Remove and release the subscription for `topic`
    ///
    /// A no-op when the topic has no subscription.
    pub fn unsubscribe(&self, topic: &str) {
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;

        if inner.subs.remove(topic).is_some() {
            Self::release(&inner.link, topic);
            tracing::debug!(
                topic = %topic,
                subscriptions = inner.subs.len(),
                "Subscriber removed"
            );
        }
    }

    /// Release every tracked subscription
    ///
    /// Used during full teardown. The map is emptied unconditionally:
    /// transport-level release failures (the session is usually already
    /// closed at this point) are logged and swallowed.
    pub fn unsubscribe_all(&self) {
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;

        let released = inner.subs.len();
        for (topic, _) in inner.subs.drain() {
            Self::release(&inner.link, &topic);
        }

        if released > 0 {
            tracing::info!(released = released, "All subscriptions released");
        }
    }

    /// Route an inbound frame to the active callback for its topic
    ///
    /// Frames for topics without a live subscription are dropped. A decode
    /// failure is logged and the raw body is passed through to the callback
    /// instead of being discarded.
    pub fn dispatch(&self, frame: &WireFrame) {
        let (callback, epoch) = {
            let inner = self.inner.lock().unwrap();
            match inner.subs.get(&frame.destination) {
                Some(entry) => (Arc::clone(&entry.callback), entry.epoch),
                None => {
                    tracing::trace!(topic = %frame.destination, "Frame for inactive topic dropped");
                    return;
                }
            }
        };

        // The unsubscribe ack is asynchronous; confirm this entry is still
        // the active one for the topic before touching application code.
        if !self.is_active(&frame.destination, epoch) {
            tracing::trace!(topic = %frame.destination, "Stale frame dropped");
            return;
        }

        match codec::decode(frame) {
            Ok(event) => callback(event),
            Err(err) => {
                tracing::warn!(
                    topic = %frame.destination,
                    error = %err,
                    "Undecodable frame, passing raw body through"
                );
                callback(InboundEvent::Raw {
                    destination: frame.destination.clone(),
                    body: frame.body.clone(),
                });
            }
        }
    }

    /// Whether `epoch` is still the live registration for `topic`
    pub fn is_active(&self, topic: &str, epoch: u64) -> bool {
        self.inner
            .lock()
            .unwrap()
            .subs
            .get(topic)
            .map(|entry| entry.epoch == epoch)
            .unwrap_or(false)
    }

    /// Whether `topic` currently has a live subscription
    pub fn contains(&self, topic: &str) -> bool {
        self.inner.lock().unwrap().subs.contains_key(topic)
    }

    /// Number of live subscriptions
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().subs.len()
    }

    /// Whether no subscriptions are tracked
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(link: &Option<SessionHandle>, topic: &str) {
        if let Some(link) = link {
            if let Err(err) = link.unsubscribe(topic) {
                tracing::warn!(topic = %topic, error = %err, "Unsubscribe failed during release");
            }
        }
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
