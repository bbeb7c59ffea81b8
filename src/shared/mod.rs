//! Shared Module
//!
//! This module contains the wire types used by the hub and the LLM chat
//! endpoints. They carry no server state and serialize to the JSON shapes that
//! clients send and receive.
//!
//! # Overview
//!
//! - **`message`** - Direct-message frames on the chat socket
//! - **`event`** - Presence snapshot and transition frames
//! - **`turn`** - Conversation turns, chat replies and memory items
//! - **`error`** - Serialization and validation errors

/// Direct-message frames
pub mod message;

/// Presence frames
pub mod event;

/// Conversation turns and replies
pub mod turn;

/// Shared error types
pub mod error;

/// Re-export commonly used types for convenience
pub use message::{ClientFrame, DirectMessage, OutgoingMessage};
pub use event::{PresenceFrame, now_millis};
pub use turn::{ChatReply, ChatRequest, MemoryItem, Role, Turn};
pub use error::SharedError;
