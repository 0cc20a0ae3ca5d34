//! Shared application state

use std::sync::Arc;

use sqlx::PgPool;

use crate::chat::{store::MessageStore, RelayState};
use crate::config::Config;

/// Application state shared across all HTTP and WebSocket handlers.
/// Built once at startup; handlers receive it through the router.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pool: PgPool,
    pub relay: RelayState,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> Self {
        let relay = RelayState::new(
            MessageStore::new(pool.clone()),
            config.chat_history_limit,
            config.chat_outbound_buffer,
        );
        Self {
            config: Arc::new(config),
            pool,
            relay,
        }
    }
}
