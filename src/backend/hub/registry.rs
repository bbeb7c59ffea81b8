/**
 * Connection Registry
 *
 * Tracks, per user, the set of currently open connections. This is the single
 * source of truth for "is this user reachable right now".
 *
 * # Invariant
 *
 * A user id is present in the map if and only if its connection set is
 * non-empty. Removing the last connection removes the entry, so snapshots never
 * contain tombstones.
 *
 * # Thread Safety
 *
 * One `tokio::sync::RwLock` guards the whole map. Lookups share the read lock;
 * `add_connection` / `remove_connection` take the write lock, so a user's set
 * is never observed half-updated.
 */

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

use crate::backend::hub::connection::{ConnectionHandle, ConnectionId};

/// Per-user registry of live connections
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<String, HashMap<ConnectionId, ConnectionHandle>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `conn` under `user_id`
    ///
    /// Returns `true` when this is the user's first connection (0→1), which is
    /// the caller's cue to announce the user as online. Empty user ids are
    /// ignored.
    pub async fn add_connection(&self, user_id: &str, conn: ConnectionHandle) -> bool {
        if user_id.is_empty() {
            return false;
        }
        let mut connections = self.connections.write().await;
        let set = connections.entry(user_id.to_string()).or_default();
        let became_online = set.is_empty();
        set.insert(conn.id(), conn);
        tracing::debug!(
            "[Hub] Added connection for user {} ({} open)",
            user_id,
            set.len()
        );
        became_online
    }

    /// Remove exactly one connection
    ///
    /// Returns `true` when it was the user's last connection (1→0). Removing a
    /// connection that is not registered is a no-op and returns `false`.
    pub async fn remove_connection(&self, user_id: &str, conn_id: ConnectionId) -> bool {
        let mut connections = self.connections.write().await;
        let Some(set) = connections.get_mut(user_id) else {
            return false;
        };
        if set.remove(&conn_id).is_none() {
            return false;
        }
        if set.is_empty() {
            connections.remove(user_id);
            tracing::debug!("[Hub] Last connection closed for user {}", user_id);
            return true;
        }
        false
    }

    pub async fn is_online(&self, user_id: &str) -> bool {
        self.connections
            .read()
            .await
            .get(user_id)
            .is_some_and(|set| !set.is_empty())
    }

    /// Snapshot of every user with at least one open connection
    pub async fn list_online(&self) -> HashSet<String> {
        self.connections
            .read()
            .await
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(user_id, _)| user_id.clone())
            .collect()
    }

    /// One live connection for `user_id`, if any
    ///
    /// Connections whose writer already exited are skipped when a live one
    /// exists.
    pub async fn get_any_connection(&self, user_id: &str) -> Option<ConnectionHandle> {
        let connections = self.connections.read().await;
        let set = connections.get(user_id)?;
        set.values()
            .find(|conn| !conn.is_closed())
            .or_else(|| set.values().next())
            .cloned()
    }

    /// Every connection `user_id` has open
    pub async fn get_all_connections(&self, user_id: &str) -> Vec<ConnectionHandle> {
        self.connections
            .read()
            .await
            .get(user_id)
            .map(|set| set.values().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn connection_count(&self, user_id: &str) -> usize {
        self.connections
            .read()
            .await
            .get(user_id)
            .map_or(0, HashMap::len)
    }
}
