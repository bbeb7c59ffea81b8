//! Middleware Module
//!
//! Request-level concerns shared by handlers.
//!
//! # Architecture
//!
//! - **`auth`** - `AuthUser` / `MaybeAuthUser` extractors resolving the bearer credential
//!
//! # Example
//!
//! ```rust,ignore
//! use moehub::backend::middleware::AuthUser;
//!
//! async fn handler(user: AuthUser) -> String {
//!     user.user_id().to_string()
//! }
//! ```

pub mod auth;

pub use auth::{bearer_token, AuthUser, MaybeAuthUser};
