//! Chat Module
//!
//! Direct messaging over WebSockets and the online status queries.
//!
//! # Module Structure
//!
//! ```text
//! chat/
//! ├── router.rs  - MessageRouter, point-to-point delivery + notifications
//! ├── sockets.rs - /ws/chat, /ws/presence, /ws/remote
//! └── online.rs  - /api/chat/online and /api/chat/online/batch
//! ```
//!
//! # Frames
//!
//! ```json
//! // client -> server
//! {"type": "message", "to": "42", "content": "hi"}
//! // server -> recipient
//! {"from": "7", "content": "hi", "timestamp": 1718000000000}
//! ```

pub mod online;
pub mod router;
pub mod sockets;

pub use online::{handle_online, handle_online_batch};
pub use router::{Delivery, MessageRouter};
pub use sockets::{handle_chat_socket, handle_presence_socket, handle_remote_socket};
