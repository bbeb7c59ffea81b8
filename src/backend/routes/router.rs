//! Router Configuration
//!
//! This module provides the main router creation function that combines
//! all route configurations into a single Axum router.
//!
//! # Route Order
//!
//! 1. WebSocket routes (`/ws/*`)
//! 2. API routes (`/api/*`)
//! 3. Fallback handler (404)
//!
//! # Layers
//!
//! - `TraceLayer` logs every request through `tracing`
//! - `CorsLayer::permissive()` since the web client is served from another origin

use axum::{http::StatusCode, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::routes::ws_routes::configure_ws_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// # Route Details
///
/// ## WebSocket Routes
///
/// - `GET /ws/chat` - Direct messaging connection
/// - `GET /ws/presence` - Presence snapshot and events
/// - `GET /ws/remote` - Same-user remote-control relay
///
/// ## API Routes
///
/// - `GET /api/chat/online` - App-level online status of one user
/// - `GET /api/chat/online/batch` - Chat reachability of several users
/// - `POST /api/llm/chat` - Bounded chat turn
/// - `POST /api/llm/chat/stream` - Streaming chat (SSE)
/// - `GET /api/llm/models` - Installed models
/// - `GET|PUT /api/user/memories`, `DELETE /api/user/memories/{key}`
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new();

    let router = configure_ws_routes(router);
    let router = configure_api_routes(router);

    router
        .fallback(|| async { (StatusCode::NOT_FOUND, "404 Not Found") })
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
