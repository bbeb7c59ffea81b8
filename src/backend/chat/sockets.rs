/**
 * WebSocket Endpoints
 *
 * Three authenticated socket kinds share one lifecycle: verify the bearer
 * credential (401 before upgrading), count the socket in the app-level
 * `PresenceCounter`, pump frames until close, then unwind.
 *
 * - `/ws/chat` registers the socket through the `PresenceAwareRouter`, so
 *   the user's first and last chat sockets announce presence. Inbound frames
 *   are routed as direct messages.
 * - `/ws/presence` subscribes to presence updates. The snapshot is queued
 *   before any event. Inbound frames are read only to notice the close.
 * - `/ws/remote` relays every inbound frame verbatim to all of the same
 *   user's remote sockets, including the sender.
 */

use axum::{
    extract::{
        ws::{WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};

use crate::backend::hub::{run_socket, ConnectionHandle};
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;

/// Upgrade a chat connection (GET /ws/chat)
pub async fn handle_chat_socket(user: AuthUser, State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let AuthUser(user_id) = user;
    ws.on_upgrade(move |socket| run_chat_session(socket, state, user_id))
}

/// Upgrade a presence subscription (GET /ws/presence)
pub async fn handle_presence_socket(
    user: AuthUser,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    let AuthUser(user_id) = user;
    ws.on_upgrade(move |socket| run_presence_session(socket, state, user_id))
}

/// Upgrade a remote-control relay connection (GET /ws/remote)
pub async fn handle_remote_socket(user: AuthUser, State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let AuthUser(user_id) = user;
    ws.on_upgrade(move |socket| run_remote_session(socket, state, user_id))
}

async fn run_chat_session(socket: WebSocket, state: AppState, user_id: String) {
    let (handle, outbound) = ConnectionHandle::new();
    let conn_id = handle.id();

    state.counter.add(&user_id).await;
    state.presence.connect(&user_id, handle).await;
    tracing::info!("[Hub] Chat socket {} opened for {}", conn_id, user_id);

    let messages = state.messages.clone();
    let from = user_id.clone();
    run_socket(socket, outbound, move |text| {
        let messages = messages.clone();
        let from = from.clone();
        async move {
            messages.handle_frame(&from, &text).await;
        }
    })
    .await;

    state.presence.disconnect(&user_id, conn_id).await;
    state.counter.remove(&user_id).await;
    tracing::info!("[Hub] Chat socket {} closed for {}", conn_id, user_id);
}

async fn run_presence_session(socket: WebSocket, state: AppState, user_id: String) {
    let (handle, outbound) = ConnectionHandle::new();
    let conn_id = handle.id();

    state.counter.add(&user_id).await;
    if let Err(e) = state.presence.subscribe(&user_id, handle).await {
        tracing::warn!("[Presence] Snapshot for {} not queued: {}", user_id, e);
    }

    run_socket(socket, outbound, |_| async {}).await;

    state.presence.unsubscribe(conn_id).await;
    state.counter.remove(&user_id).await;
    tracing::debug!("[Presence] Subscriber {} for {} left", conn_id, user_id);
}

async fn run_remote_session(socket: WebSocket, state: AppState, user_id: String) {
    let (handle, outbound) = ConnectionHandle::new();
    let conn_id = handle.id();

    state.counter.add(&user_id).await;
    state.remote.add_connection(&user_id, handle).await;

    let remote = state.remote.clone();
    let owner = user_id.clone();
    run_socket(socket, outbound, move |text| {
        let remote = remote.clone();
        let owner = owner.clone();
        async move {
            for conn in remote.get_all_connections(&owner).await {
                if let Err(e) = conn.send_text(text.as_str()) {
                    tracing::warn!("[Hub] Remote relay to {} of {} failed: {}", conn.id(), owner, e);
                }
            }
        }
    })
    .await;

    state.remote.remove_connection(&user_id, conn_id).await;
    state.counter.remove(&user_id).await;
}
