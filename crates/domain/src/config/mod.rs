mod backend;
mod engine;
mod server;
mod store;
mod svr_weights;

pub use backend::*;
pub use engine::*;
pub use server::*;
pub use store::*;
pub use svr_weights::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The single configuration aggregate read once at process start.
/// Core logic never re-reads files at runtime; loaders only ever
/// produce this record.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub discussion: DiscussionConfig,
    #[serde(default)]
    pub svr_weights: SvrWeights,
    #[serde(default)]
    pub backends: BackendsConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl EngineConfig {
    /// Validate the configuration and return a list of issues.
    /// Empty vec means the config is clean.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.server.port == 0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "server.port".into(),
                message: "port must be greater than 0".into(),
            });
        }
        if self.server.host.is_empty() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "server.host".into(),
                message: "host must not be empty".into(),
            });
        }

        if self.backends.platforms.is_empty() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "backends.platforms".into(),
                message: "no agent backend platforms configured".into(),
            });
        }

        let mut seen = std::collections::HashSet::new();
        for (i, platform) in self.backends.platforms.iter().enumerate() {
            if platform.id.is_empty() {
                issues.push(ConfigIssue {
                    severity: ConfigSeverity::Error,
                    field: format!("backends.platforms[{i}].id"),
                    message: "platform id must not be empty".into(),
                });
            } else if !seen.insert(platform.id.as_str()) {
                issues.push(ConfigIssue {
                    severity: ConfigSeverity::Error,
                    field: format!("backends.platforms[{i}].id"),
                    message: format!("duplicate platform id \"{}\"", platform.id),
                });
            }
            if platform.kind == PlatformKind::HttpJson && platform.base_url.is_empty() {
                issues.push(ConfigIssue {
                    severity: ConfigSeverity::Error,
                    field: format!("backends.platforms[{i}].base_url"),
                    message: "http_json platforms require a base_url".into(),
                });
            }
        }

        if self.discussion.stop_threshold < 0.0 || self.discussion.stop_threshold > 1.0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "discussion.stop_threshold".into(),
                message: "stop_threshold must be within [0, 1]".into(),
            });
        }
        if self.discussion.quality_floor < 0.0 || self.discussion.quality_floor > 1.0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "discussion.quality_floor".into(),
                message: "quality_floor must be within [0, 1]".into(),
            });
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_modulo_platform_warning() {
        let cfg = EngineConfig::default();
        let issues = cfg.validate();
        assert!(issues
            .iter()
            .all(|i| i.severity == ConfigSeverity::Warning));
    }

    #[test]
    fn zero_port_is_an_error() {
        let mut cfg = EngineConfig::default();
        cfg.server.port = 0;
        let issues = cfg.validate();
        assert!(issues
            .iter()
            .any(|i| i.field == "server.port" && i.severity == ConfigSeverity::Error));
    }

    #[test]
    fn duplicate_platform_ids_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.backends.platforms = vec![
            PlatformConfig {
                id: "a".into(),
                kind: PlatformKind::Scripted,
                base_url: String::new(),
                api_key: None,
                api_key_env: None,
                model: None,
                max_retries: 2,
            },
            PlatformConfig {
                id: "a".into(),
                kind: PlatformKind::Scripted,
                base_url: String::new(),
                api_key: None,
                api_key_env: None,
                model: None,
                max_retries: 2,
            },
        ];
        let issues = cfg.validate();
        assert!(issues
            .iter()
            .any(|i| i.message.contains("duplicate platform id")));
    }

    #[test]
    fn http_json_platform_requires_base_url() {
        let mut cfg = EngineConfig::default();
        cfg.backends.platforms = vec![PlatformConfig {
            id: "a".into(),
            kind: PlatformKind::HttpJson,
            base_url: String::new(),
            api_key: None,
            api_key_env: None,
            model: None,
            max_retries: 2,
        }];
        let issues = cfg.validate();
        assert!(issues
            .iter()
            .any(|i| i.field.contains("base_url") && i.severity == ConfigSeverity::Error));
    }

    #[test]
    fn toml_round_trip() {
        let cfg = EngineConfig::default();
        let s = toml::to_string(&cfg).expect("serialize");
        let back: EngineConfig = toml::from_str(&s).expect("deserialize");
        assert_eq!(back.server.port, cfg.server.port);
        assert_eq!(back.discussion.max_turns, cfg.discussion.max_turns);
    }
}
