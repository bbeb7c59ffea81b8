/**
 * LLM HTTP Handlers
 *
 * - `POST /api/llm/chat` - bounded chat turn, JSON reply
 * - `POST /api/llm/chat/stream` - raw window relayed as SSE deltas
 * - `GET /api/llm/chat/ws` - same relay over a WebSocket, one request per socket
 * - `GET /api/llm/models` - installed model names
 */

use std::pin::Pin;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{
        sse::{KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures_util::{stream, Stream, StreamExt};
use serde::Serialize;

use crate::backend::error::BackendError;
use crate::backend::llm::client::{GenerationRequest, OllamaClient};
use crate::backend::llm::stream::{error_event, error_frame, relay_deltas, sse_events};
use crate::backend::middleware::MaybeAuthUser;
use crate::backend::server::state::AppState;
use crate::shared::{ChatReply, ChatRequest};

#[derive(Debug, Serialize)]
pub struct ModelList {
    pub models: Vec<String>,
}

/// Handle a chat turn (POST /api/llm/chat)
///
/// Anonymous callers are served without memory injection or extraction.
///
/// # Errors
///
/// * `400 Bad Request` - empty model name
/// * `502 Bad Gateway` - generation service failed
/// * `504 Gateway Timeout` - generation service timed out
pub async fn handle_chat(
    State(state): State<AppState>,
    user: MaybeAuthUser,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, BackendError> {
    if request.model.trim().is_empty() {
        return Err(BackendError::bad_request("model is required"));
    }
    let outcome = state.chat.chat(user.user_id(), request).await?;
    Ok(Json(outcome.reply))
}

/// Stream a chat turn (POST /api/llm/chat/stream)
///
/// The window is forwarded as sent; no memory, trimming or extraction.
/// Failures to start the stream are reported as a single SSE event
/// `{"error": "...", "done": true}`.
pub async fn handle_chat_stream(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Response {
    let timeout = state.config.ollama.stream_timeout;
    let request = GenerationRequest::new(request.model, request.messages);

    match state.ollama.stream_chat(&request, timeout).await {
        Ok(upstream) => Sse::new(sse_events(upstream))
            .keep_alive(KeepAlive::default())
            .into_response(),
        Err(e) => {
            tracing::error!("[Llm] Failed to start stream for {}: {}", request.model, e);
            let event = error_event(&e.to_string());
            Sse::new(stream::iter([Ok::<_, std::convert::Infallible>(event)])).into_response()
        }
    }
}

/// Upgrade a streaming chat socket (GET /api/llm/chat/ws)
///
/// The client sends one `{"model", "messages"}` frame and receives
/// `{"delta", "done"}` frames until the final `done`. Errors arrive as a
/// single `{"error": "...", "done": true}` frame.
pub async fn handle_chat_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_chat_ws(socket, state))
}

async fn run_chat_ws(mut socket: WebSocket, state: AppState) {
    let payload = loop {
        match socket.recv().await {
            Some(Ok(Message::Text(text))) => break text.as_str().to_owned(),
            Some(Ok(Message::Binary(bytes))) => break String::from_utf8_lossy(&bytes).into_owned(),
            Some(Ok(Message::Close(_))) | None => return,
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                tracing::debug!("[Llm] Chat socket read failed: {}", e);
                let frame = error_frame(&format!("failed to read request: {e}"));
                let _ = socket.send(Message::Text(frame.into())).await;
                return;
            }
        }
    };

    let mut frames = chat_socket_frames(&state.ollama, state.config.ollama.stream_timeout, &payload).await;
    while let Some(frame) = frames.next().await {
        if let Err(e) = socket.send(Message::Text(frame.into())).await {
            tracing::debug!("[Llm] Chat socket closed mid-stream: {}", e);
            return;
        }
    }
    let _ = socket.send(Message::Close(None)).await;
}

/// Frames answering one chat socket request
///
/// Always ends with a frame carrying `"done": true`.
pub async fn chat_socket_frames(
    ollama: &OllamaClient,
    timeout: Duration,
    payload: &str,
) -> Pin<Box<dyn Stream<Item = String> + Send>> {
    let request: ChatRequest = match serde_json::from_str(payload) {
        Ok(request) => request,
        Err(e) => return Box::pin(stream::iter([error_frame(&format!("invalid request: {e}"))])),
    };
    let request = GenerationRequest::new(request.model, request.messages);

    match ollama.stream_chat(&request, timeout).await {
        Ok(upstream) => Box::pin(relay_deltas(upstream).map(|delta| delta.to_frame())),
        Err(e) => {
            tracing::error!("[Llm] Failed to start socket stream for {}: {}", request.model, e);
            Box::pin(stream::iter([error_frame(&e.to_string())]))
        }
    }
}

/// List installed models (GET /api/llm/models)
pub async fn handle_models(State(state): State<AppState>) -> Result<Json<ModelList>, BackendError> {
    let models = state.ollama.list_models(state.config.ollama.models_timeout).await?;
    Ok(Json(ModelList { models }))
}
