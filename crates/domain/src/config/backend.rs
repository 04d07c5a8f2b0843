use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Agent backends ("platforms")
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Registered agent backends, keyed at runtime by `platform` id.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BackendsConfig {
    #[serde(default)]
    pub platforms: Vec<PlatformConfig>,
}

/// One configured backend platform (e.g. `"openai-gpt4"`, `"scripted-test"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub id: String,
    pub kind: PlatformKind,
    /// Base URL for `kind = http_json`. Ignored for `scripted`.
    #[serde(default)]
    pub base_url: String,
    /// Plaintext API key for `kind = http_json`. Takes precedence over
    /// `api_key_env` when both are set; prefer `api_key_env` in committed
    /// config so the key itself never lands in a config file.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Env var name holding the API key for `kind = http_json`.
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Model identifier passed through to the backend.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "d_max_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformKind {
    HttpJson,
    Scripted,
}

fn d_max_retries() -> u32 {
    2
}
