/**
 * Presence Event Types
 *
 * This module defines the frames pushed to presence subscribers. A subscriber
 * first receives one `presence_snapshot` listing every online user, then a
 * stream of `presence` events, one per online/offline transition.
 *
 * # Wire Format
 *
 * ```json
 * {"type":"presence_snapshot","online_user_ids":["7","9"],"timestamp":1700000000000}
 * {"type":"presence","user_id":"7","online":false,"timestamp":1700000000123}
 * ```
 *
 * Timestamps are Unix epoch milliseconds.
 */
use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;

/// Frame delivered to a presence subscriber
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PresenceFrame {
    /// A single online/offline transition
    Presence {
        /// The user whose state flipped
        user_id: String,
        /// `true` on 0→1, `false` on 1→0
        online: bool,
        /// Epoch milliseconds
        timestamp: i64,
    },
    /// One-shot list of online users sent right after subscribing
    PresenceSnapshot {
        /// Users with at least one chat connection at snapshot time
        online_user_ids: Vec<String>,
        /// Epoch milliseconds
        timestamp: i64,
    },
}

impl PresenceFrame {
    /// Create a transition event stamped with the current time
    pub fn transition(user_id: impl Into<String>, online: bool) -> Self {
        Self::Presence {
            user_id: user_id.into(),
            online,
            timestamp: now_millis(),
        }
    }

    /// Create a snapshot frame stamped with the current time
    ///
    /// The ids are sorted so clients and tests see a stable order.
    pub fn snapshot(mut online_user_ids: Vec<String>) -> Self {
        online_user_ids.sort();
        Self::PresenceSnapshot {
            online_user_ids,
            timestamp: now_millis(),
        }
    }

    /// Serialize to the JSON text sent over the socket
    pub fn to_json(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Current time as Unix epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
