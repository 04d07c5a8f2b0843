use serde::{Deserialize, Serialize};

/// Immutable agent descriptor. Created when a room is created, destroyed
/// with the room. Never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    pub agent_id: String,
    pub display_name: String,
    pub role: String,
    pub system_prompt: String,
    /// Platform id resolved through `BackendRegistry` to a concrete backend.
    pub backend: String,
    #[serde(default)]
    pub model_params: ModelParams,
}

/// Free-form sampling parameters passed through to the agent backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelParams {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl AgentSpec {
    pub fn new(
        agent_id: impl Into<String>,
        display_name: impl Into<String>,
        role: impl Into<String>,
        system_prompt: impl Into<String>,
        backend: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            display_name: display_name.into(),
            role: role.into(),
            system_prompt: system_prompt.into(),
            backend: backend.into(),
            model_params: ModelParams::default(),
        }
    }

    /// Role-prompt tokens used for topical-relevance scoring in SVR.
    pub fn role_tokens(&self) -> Vec<String> {
        crate::context::tokenize(&format!("{} {}", self.role, self.system_prompt))
    }
}
