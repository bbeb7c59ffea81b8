//! Backend Error Module
//!
//! Error types returned by HTTP handlers and their conversion to HTTP
//! responses.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - IntoResponse implementation
//! ```
//!
//! Only failures that block a requested reply reach a client. Presence
//! broadcasts, summarization and memory extraction degrade silently and never
//! produce a `BackendError`.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

pub use types::BackendError;
