//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - A recording, scripted text generator
//! - Recording connections for the hub
//! - App state and token helpers
//! - Custom assertion macros

#![allow(dead_code)]

pub mod assertions;
pub mod generator;

use std::sync::Arc;

use moehub::backend::llm::TextGenerator;
use moehub::backend::persistence::InMemoryPersistence;
use moehub::backend::server::{AppState, ServerConfig};

pub use generator::*;
pub use hub::*;

pub const TEST_SECRET: &str = "moehub-test-secret";

/// Fresh application state over in-memory persistence
///
/// The Ollama base URL points at a closed local port, so streaming and
/// model listing fail fast unless a test overrides it.
pub fn test_state(generator: Arc<dyn TextGenerator>) -> (AppState, Arc<InMemoryPersistence>) {
    test_state_with_ollama(generator, "http://127.0.0.1:9")
}

/// Like [`test_state`], with streaming and model listing sent to `base_url`
pub fn test_state_with_ollama(
    generator: Arc<dyn TextGenerator>,
    base_url: &str,
) -> (AppState, Arc<InMemoryPersistence>) {
    let mut config = ServerConfig::with_secret(TEST_SECRET);
    config.ollama.base_url = base_url.to_string();
    let persistence = Arc::new(InMemoryPersistence::new());
    let state = AppState::new(config, persistence.clone(), generator);
    (state, persistence)
}

/// Signed bearer token for `user_id`
pub fn token_for(state: &AppState, user_id: &str) -> String {
    state.verifier.issue(user_id, None).expect("issue test token")
}
