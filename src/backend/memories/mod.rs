//! User memory management endpoints

pub mod handlers;

pub use handlers::{handle_delete_memory, handle_list_memories, handle_upsert_memory};
