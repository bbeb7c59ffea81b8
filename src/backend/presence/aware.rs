/**
 * Presence-Aware Router
 *
 * Decorates a `ConnectionRegistry` with the presence side effect: connecting a
 * user's first chat socket announces them online, closing their last one
 * announces them offline. Additional sockets for an already-online user are
 * silent.
 */

use std::sync::Arc;

use crate::backend::hub::{ConnectionHandle, ConnectionId, ConnectionRegistry, DeliveryError};
use crate::backend::presence::broadcaster::PresenceBroadcaster;

#[derive(Debug, Clone)]
pub struct PresenceAwareRouter {
    registry: Arc<ConnectionRegistry>,
    broadcaster: Arc<PresenceBroadcaster>,
}

impl PresenceAwareRouter {
    pub fn new(registry: Arc<ConnectionRegistry>, broadcaster: Arc<PresenceBroadcaster>) -> Self {
        Self {
            registry,
            broadcaster,
        }
    }

    /// Register a chat connection; `true` if the user came online
    pub async fn connect(&self, user_id: &str, conn: ConnectionHandle) -> bool {
        let subscribers = self.broadcaster.lock().await;
        let became_online = self.registry.add_connection(user_id, conn).await;
        if became_online {
            tracing::info!("[Presence] user {} is online", user_id);
            subscribers.announce(user_id, true);
        }
        became_online
    }

    /// Unregister a chat connection; `true` if the user went offline
    pub async fn disconnect(&self, user_id: &str, conn_id: ConnectionId) -> bool {
        let subscribers = self.broadcaster.lock().await;
        let went_offline = self.registry.remove_connection(user_id, conn_id).await;
        if went_offline {
            tracing::info!("[Presence] user {} is offline", user_id);
            subscribers.announce(user_id, false);
        }
        went_offline
    }

    /// Add a presence subscriber and queue its snapshot
    pub async fn subscribe(&self, user_id: &str, conn: ConnectionHandle) -> Result<(), DeliveryError> {
        self.broadcaster.subscribe(user_id, conn, &self.registry).await
    }

    pub async fn unsubscribe(&self, conn_id: ConnectionId) -> bool {
        self.broadcaster.unsubscribe(conn_id).await
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn broadcaster(&self) -> &Arc<PresenceBroadcaster> {
        &self.broadcaster
    }
}
