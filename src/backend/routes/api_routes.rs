/**
 * API Route Handlers
 *
 * This module wires the JSON/SSE endpoints and the public chat socket.
 *
 * # Routes
 *
 * ## Chat status
 * - `GET /api/chat/online?user_id=X` - Public
 * - `GET /api/chat/online/batch?user_ids=a,b` - Public
 *
 * ## LLM
 * - `POST /api/llm/chat` - Optional authentication (memory only when authenticated)
 * - `POST /api/llm/chat/stream` - Public
 * - `GET /api/llm/chat/ws` - Public (WebSocket)
 * - `GET /api/llm/models` - Public
 *
 * ## Memories
 * - `GET /api/user/memories` - Requires authentication
 * - `PUT /api/user/memories` - Requires authentication
 * - `DELETE /api/user/memories/{key}` - Requires authentication
 */

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::backend::chat::{handle_online, handle_online_batch};
use crate::backend::llm::handlers::{handle_chat, handle_chat_stream, handle_chat_ws, handle_models};
use crate::backend::memories::{handle_delete_memory, handle_list_memories, handle_upsert_memory};
use crate::backend::server::state::AppState;

/// Configure API routes
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        // Online status
        .route("/api/chat/online", get(handle_online))
        .route("/api/chat/online/batch", get(handle_online_batch))
        // LLM
        .route("/api/llm/chat", post(handle_chat))
        .route("/api/llm/chat/stream", post(handle_chat_stream))
        .route("/api/llm/chat/ws", get(handle_chat_ws))
        .route("/api/llm/models", get(handle_models))
        // Memories
        .route(
            "/api/user/memories",
            get(handle_list_memories).put(handle_upsert_memory),
        )
        .route("/api/user/memories/{key}", delete(handle_delete_memory))
}
