/**
 * Server Initialization
 *
 * This module builds the application from a `ServerConfig`.
 *
 * # Initialization Process
 *
 * 1. Choose the persistence collaborator (Postgres or in-memory)
 * 2. Build `AppState` with the Ollama client as text generator
 * 3. Create and configure the router
 * 4. Start the housekeeping task
 *
 * # Resilience
 *
 * A missing or unreachable database does not prevent startup. The server
 * falls back to in-memory persistence and logs a warning.
 */

use std::sync::Arc;
use std::time::Duration;

use axum::Router;

use crate::backend::llm::OllamaClient;
use crate::backend::persistence::{InMemoryPersistence, PgPersistence, Persistence};
use crate::backend::presence::PresenceBroadcaster;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::ServerConfig;
use crate::backend::server::state::AppState;

/// Create and configure the Axum application
pub async fn create_app(config: ServerConfig) -> Router<()> {
    tracing::info!("[Server] Initializing moehub backend");

    let persistence = load_persistence(config.database_url.as_deref()).await;
    let generator = Arc::new(OllamaClient::new(&config.ollama.base_url));
    let interval = config.housekeeping_interval;
    let app_state = AppState::new(config, persistence, generator);

    spawn_housekeeping(app_state.presence.broadcaster().clone(), interval);
    tracing::info!("[Server] Router configured with periodic presence cleanup");

    create_router(app_state)
}

/// Postgres when `database_url` connects, in-memory otherwise
pub async fn load_persistence(database_url: Option<&str>) -> Arc<dyn Persistence> {
    let Some(url) = database_url else {
        tracing::warn!("[Server] DATABASE_URL not set. Memories and notifications are kept in memory.");
        return Arc::new(InMemoryPersistence::new());
    };

    tracing::info!("[Server] Connecting to database...");
    match PgPersistence::connect(url).await {
        Ok(pg) => {
            tracing::info!("[Server] Database ready");
            Arc::new(pg)
        }
        Err(e) => {
            tracing::error!("[Server] Database unavailable: {}", e);
            tracing::warn!("[Server] Falling back to in-memory persistence.");
            Arc::new(InMemoryPersistence::new())
        }
    }
}

/// Periodically drop presence subscribers whose socket has gone away
pub fn spawn_housekeeping(broadcaster: Arc<PresenceBroadcaster>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        loop {
            interval.tick().await;
            let pruned = broadcaster.prune_closed().await;
            if pruned > 0 {
                tracing::debug!("[Presence] Pruned {} closed subscribers", pruned);
            }
        }
    })
}
