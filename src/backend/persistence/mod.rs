//! Persistence Module
//!
//! The narrow storage interface the hub and the chat service depend on:
//! long-term user memories and direct-message notifications.
//!
//! # Architecture
//!
//! - **`Persistence`** - Object-safe async trait consumed through `Arc<dyn Persistence>`
//! - **`postgres`** - `PgPersistence`, sqlx over PostgreSQL with embedded migrations
//! - **`in_memory`** - `InMemoryPersistence`, used by tests and database-less runs
//!
//! Memories are unique per (user, key). Writing an existing key replaces
//! its value (last write wins).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// PostgreSQL implementation
pub mod postgres;

/// In-process implementation
pub mod in_memory;

pub use in_memory::InMemoryPersistence;
pub use postgres::PgPersistence;

/// Longest notification preview stored, in code points
pub const NOTIFICATION_PREVIEW_CHARS: usize = 100;

/// A stored memory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserMemory {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Category of a notification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    DirectMessage,
}

impl NotificationKind {
    /// Numeric code stored in the notifications table
    pub fn code(&self) -> i16 {
        match self {
            NotificationKind::DirectMessage => 6,
        }
    }
}

/// Notification to be created for `user_id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: String,
    pub sender_id: String,
    pub kind: NotificationKind,
    pub content: String,
}

impl NewNotification {
    /// Notification for a direct message, with the preview truncated
    pub fn direct_message(to: &str, from: &str, content: &str) -> Self {
        Self {
            user_id: to.to_string(),
            sender_id: from.to_string(),
            kind: NotificationKind::DirectMessage,
            content: content.chars().take(NOTIFICATION_PREVIEW_CHARS).collect(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Storage collaborator for memories and notifications
#[async_trait]
pub trait Persistence: Send + Sync {
    /// All memories of a user, ordered by key
    async fn user_memories(&self, user_id: &str) -> Result<Vec<UserMemory>, PersistenceError>;

    /// Insert or replace the memory stored under (user, key)
    async fn upsert_memory(&self, user_id: &str, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Delete one memory; `true` if it existed
    async fn delete_memory(&self, user_id: &str, key: &str) -> Result<bool, PersistenceError>;

    async fn create_notification(&self, notification: NewNotification) -> Result<(), PersistenceError>;
}
