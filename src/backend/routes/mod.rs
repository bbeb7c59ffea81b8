//! Route Configuration Module
//!
//! This module configures all HTTP routes for the backend server.
//! Routes are organized by functionality into focused submodules.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - Main router creation and layers
//! ├── ws_routes.rs    - WebSocket upgrades
//! └── api_routes.rs   - JSON and SSE endpoints
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use moehub::backend::routes::create_router;
//!
//! let router = create_router(app_state);
//! ```

/// Main router creation
pub mod router;

/// WebSocket routes
pub mod ws_routes;

/// API endpoint routes
pub mod api_routes;

pub use router::create_router;
