use async_trait::async_trait;
use conclave_domain::think::ThinkError;

/// One line of prior conversation passed to `Think` as context.
#[derive(Debug, Clone)]
pub struct HistoryTurn {
    pub speaker: String,
    pub content: String,
}

/// Sampling parameters for a single `Think` call.
#[derive(Debug, Clone, Default)]
pub struct ThinkParams {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Everything `Think` needs to produce one reply.
#[derive(Debug, Clone)]
pub struct ThinkRequest {
    pub room_id: String,
    pub system_prompt: String,
    pub history: Vec<HistoryTurn>,
    pub params: ThinkParams,
}

/// Token accounting returned alongside a reply.
#[derive(Debug, Clone, Copy, Default)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A completed `Think` call.
#[derive(Debug, Clone)]
pub struct ThinkReply {
    pub text: String,
    pub usage: Usage,
}

/// The one capability interface an agent backend must implement.
///
/// A pure function of its inputs plus whatever remote state the backend
/// talks to. Implementations own their own retry/timeout machinery and must
/// surface one of [`ThinkError`]'s distinguishable variants rather than a
/// raw transport error.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    async fn think(&self, req: ThinkRequest) -> Result<ThinkReply, ThinkError>;

    /// The platform id this backend instance was registered under.
    fn platform_id(&self) -> &str;
}
