/**
 * Presence Broadcaster
 *
 * Holds the set of presence subscribers (clients connected to the presence
 * socket) and fans out online/offline transitions to them.
 *
 * # Ordering
 *
 * The subscriber set sits behind one `tokio::sync::Mutex`. Subscribing inserts
 * the subscriber, reads the registry and queues the snapshot while holding
 * that lock; transitions (see `PresenceAwareRouter`) take the same lock before
 * touching the registry and keep it until the event is queued. Every
 * transition is therefore either already reflected in a subscriber's snapshot
 * or delivered after it, never both and never neither.
 *
 * # Failure Handling
 *
 * Delivery is fire-and-forget. A subscriber whose queue is closed or full is
 * logged and skipped; `prune_closed` removes dead subscribers later.
 */

use std::collections::HashMap;

use tokio::sync::{Mutex, MutexGuard};

use crate::backend::hub::{ConnectionHandle, ConnectionId, ConnectionRegistry, DeliveryError};
use crate::shared::PresenceFrame;

#[derive(Debug, Clone)]
struct Subscriber {
    user_id: String,
    handle: ConnectionHandle,
}

/// Presence subscribers, reachable only through [`PresenceBroadcaster::lock`]
#[derive(Debug, Default)]
pub struct SubscriberSet {
    subscribers: HashMap<ConnectionId, Subscriber>,
}

impl SubscriberSet {
    /// Deliver a transition for `user_id` to every other user's subscribers
    ///
    /// Returns the number of subscribers the event was queued for.
    pub fn announce(&self, user_id: &str, online: bool) -> usize {
        let frame = PresenceFrame::transition(user_id, online);
        let json = match frame.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("[Presence] Failed to encode presence event: {}", e);
                return 0;
            }
        };

        let mut delivered = 0;
        for (conn_id, subscriber) in &self.subscribers {
            if subscriber.user_id == user_id {
                continue;
            }
            match subscriber.handle.send_text(json.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => tracing::warn!(
                    "[Presence] Failed to deliver presence event to subscriber {} ({}): {}",
                    conn_id,
                    subscriber.user_id,
                    e
                ),
            }
        }
        tracing::debug!(
            "[Presence] user {} online={} announced to {} subscribers",
            user_id,
            online,
            delivered
        );
        delivered
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct PresenceBroadcaster {
    subscribers: Mutex<SubscriberSet>,
}

impl PresenceBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the subscriber set
    ///
    /// Hold the guard across a registry mutation and the matching
    /// [`SubscriberSet::announce`] call.
    pub async fn lock(&self) -> MutexGuard<'_, SubscriberSet> {
        self.subscribers.lock().await
    }

    /// Register a subscriber and queue its snapshot
    ///
    /// The snapshot is taken from `registry` after registration and before the
    /// lock is released, so the subscriber sees the snapshot first and then
    /// exactly the transitions that happen after it.
    pub async fn subscribe(
        &self,
        user_id: &str,
        handle: ConnectionHandle,
        registry: &ConnectionRegistry,
    ) -> Result<(), DeliveryError> {
        let mut set = self.subscribers.lock().await;
        set.subscribers.insert(
            handle.id(),
            Subscriber {
                user_id: user_id.to_string(),
                handle: handle.clone(),
            },
        );

        let online: Vec<String> = registry.list_online().await.into_iter().collect();
        let snapshot = PresenceFrame::snapshot(online);
        match snapshot.to_json() {
            Ok(json) => handle.send_text(json),
            Err(e) => {
                tracing::error!("[Presence] Failed to encode snapshot: {}", e);
                Ok(())
            }
        }
    }

    /// Remove a subscriber; `true` if it was registered
    pub async fn unsubscribe(&self, conn_id: ConnectionId) -> bool {
        self.subscribers
            .lock()
            .await
            .subscribers
            .remove(&conn_id)
            .is_some()
    }

    /// Drop subscribers whose socket writer has exited
    pub async fn prune_closed(&self) -> usize {
        let mut set = self.subscribers.lock().await;
        let before = set.subscribers.len();
        set.subscribers.retain(|_, s| !s.handle.is_closed());
        before - set.subscribers.len()
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }
}
