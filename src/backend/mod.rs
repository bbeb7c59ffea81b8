//! Backend Module
//!
//! This module contains all server-side code for moehub: an Axum server
//! hosting the presence and messaging hub and the bounded LLM chat service.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! The backend is organized into focused submodules, leaves first:
//!
//! - **`hub`** - Connection handles, the connection registry, the socket pump
//! - **`presence`** - Presence counter, broadcaster, presence-aware router
//! - **`persistence`** - Storage collaborator (Postgres or in-memory)
//! - **`chat`** - Direct message routing, WebSocket endpoints, online queries
//! - **`llm`** - Context window management, summarization, memory extraction
//! - **`memories`** - Manual memory management endpoints
//! - **`auth`** - Bearer token verification
//! - **`middleware`** - Authentication extractors
//! - **`error`** - Backend error types
//! - **`server`** - Configuration, application state, initialization
//! - **`routes`** - Router assembly
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - Server binary
//! ├── hub/            - Connection registry
//! ├── presence/       - Presence tracking and broadcasting
//! ├── persistence/    - Memories and notifications storage
//! ├── chat/           - Messaging and sockets
//! ├── llm/            - Chat service
//! ├── memories/       - Memory endpoints
//! ├── auth/           - Token verification
//! ├── middleware/     - Extractors
//! ├── error/          - Error types
//! ├── server/         - Config, state, init
//! └── routes/         - Route configuration
//! ```
//!
//! # State Management
//!
//! All shared state lives in `AppState`, built once by
//! `server::init::create_app` and cloned into handlers. The connection
//! registry and the presence subscriber set are the only shared mutable
//! structures, and each does its own locking.

pub mod auth;
pub mod chat;
pub mod error;
pub mod hub;
pub mod llm;
pub mod memories;
pub mod middleware;
pub mod persistence;
pub mod presence;
pub mod routes;
pub mod server;

pub use error::BackendError;
pub use server::{create_app, AppState, ServerConfig};
