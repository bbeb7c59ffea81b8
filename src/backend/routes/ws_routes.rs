//! WebSocket routes
//!
//! All three require a bearer credential (`?token=` or `Authorization`) and
//! answer 401 before upgrading when it is missing or invalid.

use axum::{routing::get, Router};

use crate::backend::chat::{handle_chat_socket, handle_presence_socket, handle_remote_socket};
use crate::backend::server::state::AppState;

pub fn configure_ws_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/ws/chat", get(handle_chat_socket))
        .route("/ws/presence", get(handle_presence_socket))
        .route("/ws/remote", get(handle_remote_socket))
}
