//! Server Module
//!
//! This module contains the code that assembles the Axum application: the
//! configuration, the shared state and the composition root.
//!
//! # Architecture
//!
//! - **`config`** - Layered configuration (defaults, TOML file, environment)
//! - **`state`** - `AppState`, the shared handler state
//! - **`init`** - Persistence selection, app creation, housekeeping task
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs          - Module exports and documentation
//! ├── config.rs       - ServerConfig, OllamaConfig, ConfigError
//! ├── state.rs        - AppState, shared handler state
//! └── init.rs         - Server initialization and app creation
//! ```
//!
//! # Initialization Flow
//!
//! 1. **Configuration Loading**: `ServerConfig::load()`
//! 2. **Persistence**: Postgres if `DATABASE_URL` connects, in-memory otherwise
//! 3. **State Creation**: registries, broadcaster, counter, chat service
//! 4. **Background Tasks**: presence subscriber housekeeping every 5 minutes
//! 5. **Router Creation**: routes, CORS and request tracing
//!
//! # Example
//!
//! ```rust,no_run
//! use moehub::backend::server::{config::ServerConfig, create_app};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::load()?;
//! let app = create_app(config).await;
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

/// Server configuration loading
pub mod config;

/// Application state management
pub mod state;

/// Server initialization
pub mod init;

pub use config::{ConfigError, ServerConfig};
pub use init::create_app;
pub use state::AppState;
