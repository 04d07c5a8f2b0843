//! Shared application state injected into every axum handler and into the
//! WebSocket bridge.

use std::path::PathBuf;
use std::sync::Arc;

use conclave_domain::config::EngineConfig;
use sha2::{Digest, Sha256};

use crate::hub::ClientHub;
use crate::manager::FrameworkManager;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EngineConfig>,
    pub manager: Arc<FrameworkManager>,
    pub hub: Arc<ClientHub>,
    /// Path the running config was loaded from, if any. `/api/settings`
    /// writes a new config here; there is no live hot-reload — a change
    /// takes effect on the next restart.
    pub config_path: Option<PathBuf>,
    /// SHA-256 digest of the configured bearer token. `None` means
    /// authentication is disabled (dev mode) because the env var named by
    /// `config.server.api_token_env` was unset or empty.
    pub api_token_hash: Option<Vec<u8>>,
}

impl AppState {
    pub fn new(
        config: Arc<EngineConfig>,
        manager: Arc<FrameworkManager>,
        hub: Arc<ClientHub>,
        config_path: Option<PathBuf>,
    ) -> Self {
        let api_token_hash = std::env::var(&config.server.api_token_env)
            .ok()
            .filter(|t| !t.is_empty())
            .map(|t| Sha256::digest(t.as_bytes()).to_vec());

        if api_token_hash.is_none() {
            tracing::warn!(
                env_var = %config.server.api_token_env,
                "no API token configured; running with authentication disabled"
            );
        }

        Self {
            config,
            manager,
            hub,
            config_path,
            api_token_hash,
        }
    }
}
