//! Online status queries
//!
//! The single-user query answers from the app-level `PresenceCounter` (any
//! live socket). The batch query answers chat reachability from the
//! connection registry.

use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OnlineQuery {
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OnlineStatus {
    pub user_id: String,
    pub online: bool,
}

#[derive(Debug, Deserialize)]
pub struct BatchOnlineQuery {
    #[serde(default)]
    pub user_ids: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchOnlineStatus {
    pub online: BTreeMap<String, bool>,
}

/// GET /api/chat/online?user_id=X
pub async fn handle_online(
    State(state): State<AppState>,
    Query(query): Query<OnlineQuery>,
) -> Result<Json<OnlineStatus>, BackendError> {
    let user_id = query.user_id.trim();
    if user_id.is_empty() {
        return Err(BackendError::bad_request("user_id is required"));
    }
    let online = state.counter.is_online(user_id).await;
    Ok(Json(OnlineStatus {
        user_id: user_id.to_string(),
        online,
    }))
}

/// GET /api/chat/online/batch?user_ids=a,b,c
pub async fn handle_online_batch(
    State(state): State<AppState>,
    Query(query): Query<BatchOnlineQuery>,
) -> Json<BatchOnlineStatus> {
    let registry = state.presence.registry();
    let mut online = BTreeMap::new();
    for id in split_ids(&query.user_ids) {
        let is_online = registry.is_online(id).await;
        online.insert(id.to_string(), is_online);
    }
    Json(BatchOnlineStatus { online })
}

fn split_ids(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}
