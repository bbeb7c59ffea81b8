//! Connection Hub Module
//!
//! Process-local bookkeeping of live WebSocket connections.
//!
//! # Architecture
//!
//! - **`connection`** - `ConnectionHandle`, the queued sending half of a socket
//! - **`registry`** - `ConnectionRegistry`, user id → set of open connections
//! - **`socket`** - The read loop / writer task pair that drives one socket
//!
//! # Module Structure
//!
//! ```text
//! hub/
//! ├── mod.rs         - Module exports and documentation
//! ├── connection.rs  - Connection handles and delivery errors
//! ├── registry.rs    - Per-user connection registry
//! └── socket.rs      - WebSocket pump
//! ```
//!
//! Nothing here is persisted: registries start empty and are rebuilt as
//! clients reconnect after a restart.

pub mod connection;

pub mod registry;

pub mod socket;

pub use connection::{ConnectionHandle, ConnectionId, DeliveryError};
pub use registry::ConnectionRegistry;
pub use socket::run_socket;
