//! Shared application state.

use std::sync::Arc;

use crate::config::ServerConfig;

/// State shared by every handler.
///
/// Each WebSocket connection builds its own Live session from `config`, so
/// nothing here is mutated after startup.
#[derive(Debug)]
pub struct AppState {
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        Arc::new(Self { config })
    }
}
