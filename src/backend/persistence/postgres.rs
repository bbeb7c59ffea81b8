/**
 * PostgreSQL Persistence
 *
 * sqlx-backed implementation of `Persistence`. Migrations under `migrations/`
 * are embedded at compile time and run on connect.
 *
 * # Tables
 *
 * - `user_memories (user_id, key)` unique, upserted with `ON CONFLICT`
 * - `notifications` append-only
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{NewNotification, Persistence, PersistenceError, UserMemory};

#[derive(Debug, Clone)]
pub struct PgPersistence {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct MemoryRow {
    key: String,
    value: String,
    updated_at: DateTime<Utc>,
}

impl PgPersistence {
    /// Connect and bring the schema up to date
    pub async fn connect(database_url: &str) -> Result<Self, PersistenceError> {
        tracing::info!("Connecting to database...");
        let pool = PgPool::connect(database_url).await?;
        tracing::info!("Running database migrations...");
        sqlx::migrate!().run(&pool).await?;
        tracing::info!("Database migrations completed successfully");
        Ok(Self { pool })
    }
}

#[async_trait]
impl Persistence for PgPersistence {
    async fn user_memories(&self, user_id: &str) -> Result<Vec<UserMemory>, PersistenceError> {
        let rows = sqlx::query_as::<_, MemoryRow>(
            "SELECT key, value, updated_at FROM user_memories WHERE user_id = $1 ORDER BY key",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| UserMemory {
                key: row.key,
                value: row.value,
                updated_at: row.updated_at,
            })
            .collect())
    }

    async fn upsert_memory(&self, user_id: &str, key: &str, value: &str) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            INSERT INTO user_memories (user_id, key, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, key)
            DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_memory(&self, user_id: &str, key: &str) -> Result<bool, PersistenceError> {
        let result = sqlx::query("DELETE FROM user_memories WHERE user_id = $1 AND key = $2")
            .bind(user_id)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_notification(&self, notification: NewNotification) -> Result<(), PersistenceError> {
        sqlx::query(
            "INSERT INTO notifications (user_id, sender_id, kind, content) VALUES ($1, $2, $3, $4)",
        )
        .bind(&notification.user_id)
        .bind(&notification.sender_id)
        .bind(notification.kind.code())
        .bind(&notification.content)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
