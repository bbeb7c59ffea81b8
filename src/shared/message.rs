/**
 * Direct Message Frames
 *
 * This module defines the frames exchanged over the chat WebSocket.
 *
 * Inbound (client → server):
 *
 * ```json
 * {"type":"message","to":"9","content":"hi"}
 * ```
 *
 * Outbound (server → recipient):
 *
 * ```json
 * {"from":"7","content":"hi","timestamp":1700000000000}
 * ```
 *
 * Inbound frames that fail to decode, carry another `type`, or lack a
 * recipient or content are ignored by the caller rather than answered with
 * an error frame.
 */
use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;
use crate::shared::event::now_millis;

/// Raw inbound frame as sent by a chat client
///
/// Every field is optional on the wire so that partial frames decode and can be
/// rejected by [`ClientFrame::into_outgoing`] instead of failing JSON parsing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientFrame {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub content: String,
}

/// A validated request to deliver `content` to `to`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub to: String,
    pub content: String,
}

impl ClientFrame {
    /// Frame type that carries a direct message
    pub const MESSAGE: &'static str = "message";

    /// Decode a text frame
    pub fn parse(text: &str) -> Result<Self, SharedError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Keep only well-formed chat messages
    pub fn into_outgoing(self) -> Option<OutgoingMessage> {
        if self.kind != Self::MESSAGE || self.to.is_empty() || self.content.is_empty() {
            return None;
        }
        Some(OutgoingMessage {
            to: self.to,
            content: self.content,
        })
    }
}

/// Message written to the recipient's connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectMessage {
    pub from: String,
    pub content: String,
    /// Epoch milliseconds
    pub timestamp: i64,
}

impl DirectMessage {
    pub fn new(from: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            content: content.into(),
            timestamp: now_millis(),
        }
    }

    pub fn to_json(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }
}
