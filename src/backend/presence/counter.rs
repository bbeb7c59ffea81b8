/**
 * App-Level Presence Counter
 *
 * Counts live sockets of every kind (chat, presence, remote) per user. A user
 * is "active in the app" while the count is above zero. `add` / `remove`
 * report the 0→1 and 1→0 transitions so callers can react only to real
 * changes.
 */

use std::collections::HashMap;

use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct PresenceCounter {
    online: RwLock<HashMap<String, usize>>,
}

impl PresenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment; `true` if the user just became online
    pub async fn add(&self, user_id: &str) -> bool {
        if user_id.is_empty() {
            return false;
        }
        let mut online = self.online.write().await;
        let count = online.entry(user_id.to_string()).or_insert(0);
        *count += 1;
        *count == 1
    }

    /// Decrement; `true` if the user just went offline
    ///
    /// Removing a user that is not counted is a no-op.
    pub async fn remove(&self, user_id: &str) -> bool {
        if user_id.is_empty() {
            return false;
        }
        let mut online = self.online.write().await;
        match online.get_mut(user_id) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                online.remove(user_id);
                true
            }
            None => false,
        }
    }

    pub async fn is_online(&self, user_id: &str) -> bool {
        self.online.read().await.get(user_id).is_some_and(|n| *n > 0)
    }

    pub async fn online_user_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .online
            .read()
            .await
            .iter()
            .filter(|(_, n)| **n > 0)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }
}
