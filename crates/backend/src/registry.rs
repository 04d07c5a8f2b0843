//! Backend registry.
//!
//! Maps a `platform` id (as named on an `AgentSpec.backend`) to a concrete
//! `Arc<dyn AgentBackend>`. Built from `BackendsConfig` at startup; `Scripted`
//! platforms are not constructible from config alone (they need a caller-
//! supplied script) and must be registered via [`BackendRegistry::insert`]
//! instead — tests do this directly.

use std::collections::HashMap;
use std::sync::Arc;

use conclave_domain::config::{BackendsConfig, PlatformKind};

use crate::http_json::HttpJsonBackend;
use crate::traits::AgentBackend;
use crate::util::mask_secrets;

/// Records a platform that failed to initialize from config.
#[derive(Debug, Clone)]
pub struct PlatformInitError {
    pub platform_id: String,
    pub error: String,
}

pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn AgentBackend>>,
    init_errors: Vec<PlatformInitError>,
}

impl BackendRegistry {
    pub fn empty() -> Self {
        Self {
            backends: HashMap::new(),
            init_errors: Vec::new(),
        }
    }

    /// Build the registry from `BackendsConfig`. `http_json` platforms are
    /// instantiated eagerly; `scripted` platforms are skipped (see module
    /// docs) and must be inserted separately.
    pub fn from_config(config: &BackendsConfig) -> Self {
        let mut backends: HashMap<String, Arc<dyn AgentBackend>> = HashMap::new();
        let mut init_errors = Vec::new();

        for platform in &config.platforms {
            match platform.kind {
                PlatformKind::HttpJson => match HttpJsonBackend::from_config(platform) {
                    Ok(backend) => {
                        tracing::info!(platform_id = %platform.id, "registered agent backend");
                        backends.insert(platform.id.clone(), Arc::new(backend));
                    }
                    Err(e) => {
                        let safe_error = mask_secrets(&e.to_string());
                        tracing::warn!(
                            platform_id = %platform.id,
                            error = %safe_error,
                            "failed to initialize agent backend, skipping"
                        );
                        init_errors.push(PlatformInitError {
                            platform_id: platform.id.clone(),
                            error: safe_error,
                        });
                    }
                },
                PlatformKind::Scripted => {
                    tracing::debug!(
                        platform_id = %platform.id,
                        "scripted platform declared in config; register its backend at runtime"
                    );
                }
            }
        }

        Self {
            backends,
            init_errors,
        }
    }

    /// Register (or replace) a backend under a platform id.
    pub fn insert(&mut self, platform_id: impl Into<String>, backend: Arc<dyn AgentBackend>) {
        self.backends.insert(platform_id.into(), backend);
    }

    pub fn get(&self, platform_id: &str) -> Option<Arc<dyn AgentBackend>> {
        self.backends.get(platform_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn init_errors(&self) -> &[PlatformInitError] {
        &self.init_errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::ScriptedBackend;
    use conclave_domain::config::PlatformConfig;

    #[test]
    fn http_json_platform_missing_key_is_skipped_not_fatal() {
        let config = BackendsConfig {
            platforms: vec![PlatformConfig {
                id: "broken".into(),
                kind: PlatformKind::HttpJson,
                base_url: "http://localhost:1".into(),
                api_key: None,
                api_key_env: Some("CONCLAVE_TEST_MISSING_KEY_XYZ".into()),
                model: None,
                max_retries: 0,
            }],
        };
        let registry = BackendRegistry::from_config(&config);
        assert!(registry.is_empty());
        assert_eq!(registry.init_errors().len(), 1);
    }

    #[test]
    fn scripted_backend_can_be_inserted_manually() {
        let mut registry = BackendRegistry::empty();
        registry.insert(
            "scripted-test",
            Arc::new(ScriptedBackend::always("scripted-test", "hi")),
        );
        assert!(registry.get("scripted-test").is_some());
        assert_eq!(registry.len(), 1);
    }
}
