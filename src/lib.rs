// Increase recursion limit for complex async operations
#![recursion_limit = "256"]

//! moehub - Presence Hub and Bounded LLM Chat
//!
//! moehub is the real-time core of a social app backend. It tracks which
//! users have live WebSocket connections, delivers direct messages and
//! presence events, and fronts a text-generation service with bounded
//! conversational context and long-term user memory.
//!
//! # Overview
//!
//! - **Presence & Messaging Hub**: a registry mapping user ids to one or more
//!   live connections, with multiplicity-aware online/offline accounting,
//!   presence snapshots and events, and best-effort direct delivery
//! - **Bounded Context Manager**: keeps each chat prompt inside a token budget
//!   by summarizing and splicing older turns, and mines exchanges for
//!   durable user memories in the background
//!
//! # Module Structure
//!
//! - **`shared`** - Wire types shared with clients
//!   - Inbound and outbound chat frames, presence frames
//!   - Conversation turns, chat requests and replies
//!   - Error types
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Connection registry and presence broadcasting
//!   - LLM chat service over Ollama
//!   - Persistence, authentication, HTTP routes
//!
//! # Feature Flags
//!
//! - **`ssr`** - Server build (enabled by default). Enables the backend
//!   modules and the Axum stack.
//!
//! # Usage
//!
//! ```rust,no_run
//! use moehub::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = create_app(ServerConfig::load()?).await;
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod shared;

#[cfg(feature = "ssr")]
pub mod backend;
