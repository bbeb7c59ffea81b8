//! Authentication Module
//!
//! Bearer token verification. Token issuance belongs to the account service;
//! this crate only resolves tokens to user ids (plus an `issue` helper for
//! tests and tooling).
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs       - Module exports and documentation
//! └── sessions.rs  - JWT claims and TokenVerifier
//! ```
//!
//! Extraction of the credential from a request (query parameter or
//! `Authorization` header) lives in `backend::middleware::auth`.

/// JWT token validation
pub mod sessions;

pub use sessions::{AuthError, Claims, TokenVerifier};
