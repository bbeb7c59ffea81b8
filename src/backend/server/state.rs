/**
 * Application State Management
 *
 * This module defines the application state shared by every handler.
 * Handlers extract the whole `State<AppState>` and pick the fields they need.
 *
 * # Architecture
 *
 * The `AppState` struct is the composition root's output. It is built once
 * and cloned into every handler, holding:
 * - The chat connection registry, behind the `PresenceAwareRouter`
 * - A second registry for remote-control relay sessions
 * - The app-level `PresenceCounter`
 * - The `MessageRouter` and `ChatService`
 * - The token verifier and persistence collaborator
 *
 * There are no process-wide singletons; tests build a fresh state each.
 *
 * # Thread Safety
 *
 * Every field is an `Arc` (or a cheap clone of `Arc`s). The registries and
 * the presence subscriber set do their own locking.
 *
 * # Example
 *
 * ```rust,ignore
 * use moehub::backend::server::state::AppState;
 * use axum::extract::State;
 *
 * async fn handler(State(state): State<AppState>) -> bool {
 *     state.counter.is_online("42").await
 * }
 * ```
 */

use std::sync::Arc;

use crate::backend::auth::TokenVerifier;
use crate::backend::chat::MessageRouter;
use crate::backend::hub::ConnectionRegistry;
use crate::backend::llm::{ChatService, OllamaClient, TextGenerator};
use crate::backend::persistence::Persistence;
use crate::backend::presence::{PresenceAwareRouter, PresenceBroadcaster, PresenceCounter};
use crate::backend::server::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub verifier: Arc<TokenVerifier>,
    /// Chat registry plus presence broadcasting
    pub presence: PresenceAwareRouter,
    /// Registry of `/ws/remote` sessions
    pub remote: Arc<ConnectionRegistry>,
    pub counter: Arc<PresenceCounter>,
    pub messages: Arc<MessageRouter>,
    pub chat: Arc<ChatService>,
    /// Direct client for streaming and model listing
    pub ollama: Arc<OllamaClient>,
    pub persistence: Arc<dyn Persistence>,
}

impl AppState {
    /// Wire up all components
    ///
    /// `generator` serves chat turns, summaries and extraction. The streaming
    /// and model-list endpoints always go to the configured Ollama server.
    pub fn new(config: ServerConfig, persistence: Arc<dyn Persistence>, generator: Arc<dyn TextGenerator>) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = Arc::new(PresenceBroadcaster::new());
        let presence = PresenceAwareRouter::new(registry.clone(), broadcaster);
        let messages = Arc::new(MessageRouter::new(registry, persistence.clone()));
        let chat = Arc::new(ChatService::new(generator, persistence.clone(), config.chat_settings()));

        Self {
            verifier: Arc::new(TokenVerifier::new(&config.jwt_secret)),
            ollama: Arc::new(OllamaClient::new(&config.ollama.base_url)),
            config: Arc::new(config),
            presence,
            remote: Arc::new(ConnectionRegistry::new()),
            counter: Arc::new(PresenceCounter::new()),
            messages,
            chat,
            persistence,
        }
    }
}
