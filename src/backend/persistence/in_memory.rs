//! In-memory persistence backed by `tokio::sync::RwLock` maps.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{NewNotification, Persistence, PersistenceError, UserMemory};

#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    memories: RwLock<HashMap<String, BTreeMap<String, UserMemory>>>,
    notifications: RwLock<Vec<NewNotification>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification created so far, oldest first
    pub async fn notifications(&self) -> Vec<NewNotification> {
        self.notifications.read().await.clone()
    }
}

#[async_trait]
impl Persistence for InMemoryPersistence {
    async fn user_memories(&self, user_id: &str) -> Result<Vec<UserMemory>, PersistenceError> {
        Ok(self
            .memories
            .read()
            .await
            .get(user_id)
            .map(|by_key| by_key.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn upsert_memory(&self, user_id: &str, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.memories
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .insert(
                key.to_string(),
                UserMemory {
                    key: key.to_string(),
                    value: value.to_string(),
                    updated_at: Utc::now(),
                },
            );
        Ok(())
    }

    async fn delete_memory(&self, user_id: &str, key: &str) -> Result<bool, PersistenceError> {
        let mut memories = self.memories.write().await;
        let Some(by_key) = memories.get_mut(user_id) else {
            return Ok(false);
        };
        let removed = by_key.remove(key).is_some();
        if by_key.is_empty() {
            memories.remove(user_id);
        }
        Ok(removed)
    }

    async fn create_notification(&self, notification: NewNotification) -> Result<(), PersistenceError> {
        self.notifications.write().await.push(notification);
        Ok(())
    }
}
