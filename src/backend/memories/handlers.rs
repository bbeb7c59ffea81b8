/**
 * User Memory Handlers
 *
 * Manual management of the long-term memories the chat service injects and
 * the extractor maintains.
 *
 * - `GET /api/user/memories`
 * - `PUT /api/user/memories` with `{"key", "value"}`
 * - `DELETE /api/user/memories/{key}`
 */

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::persistence::UserMemory;
use crate::backend::server::state::AppState;
use crate::shared::{MemoryItem, SharedError};

#[derive(Debug, Serialize)]
pub struct MemoryList {
    pub memories: Vec<UserMemory>,
}

/// List the caller's memories (GET /api/user/memories)
pub async fn handle_list_memories(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<MemoryList>, BackendError> {
    let memories = state.persistence.user_memories(user.user_id()).await?;
    Ok(Json(MemoryList { memories }))
}

/// Insert or replace one memory (PUT /api/user/memories)
///
/// Only the key is required; an empty value is stored as is.
///
/// # Errors
///
/// * `400 Bad Request` - empty key
pub async fn handle_upsert_memory(
    State(state): State<AppState>,
    user: AuthUser,
    Json(item): Json<MemoryItem>,
) -> Result<StatusCode, BackendError> {
    let key = item.key.trim();
    let value = item.value.trim();
    if key.is_empty() {
        return Err(SharedError::validation("key", "must not be empty").into());
    }

    state.persistence.upsert_memory(user.user_id(), key, value).await?;
    tracing::info!("[Memory] {} set {}", user.user_id(), key);
    Ok(StatusCode::NO_CONTENT)
}

/// Delete one memory (DELETE /api/user/memories/{key})
///
/// # Errors
///
/// * `404 Not Found` - no memory under that key
pub async fn handle_delete_memory(
    State(state): State<AppState>,
    user: AuthUser,
    Path(key): Path<String>,
) -> Result<StatusCode, BackendError> {
    if state.persistence.delete_memory(user.user_id(), &key).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(BackendError::handler(StatusCode::NOT_FOUND, format!("no memory named {key}")))
    }
}
