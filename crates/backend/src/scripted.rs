//! An in-process, deterministic backend driven by a caller-supplied script.
//!
//! Used by engine and controller tests to exercise fixed sequences of
//! replies, errors, and delays without any network I/O.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use conclave_domain::think::ThinkError;

use crate::traits::{AgentBackend, ThinkReply, ThinkRequest, Usage};

/// One scripted step: either a canned reply (with an optional artificial
/// delay) or a canned error.
#[derive(Debug, Clone)]
pub enum ScriptedStep {
    Reply { text: String, delay: Duration },
    Error(ThinkError),
}

impl ScriptedStep {
    pub fn reply(text: impl Into<String>) -> Self {
        ScriptedStep::Reply {
            text: text.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn reply_after(text: impl Into<String>, delay: Duration) -> Self {
        ScriptedStep::Reply {
            text: text.into(),
            delay,
        }
    }

    pub fn error(err: ThinkError) -> Self {
        ScriptedStep::Error(err)
    }
}

/// A scripted, deterministic [`AgentBackend`].
///
/// Steps are consumed in order; once exhausted, the last step repeats.
pub struct ScriptedBackend {
    platform_id: String,
    steps: Vec<ScriptedStep>,
    cursor: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(platform_id: impl Into<String>, steps: Vec<ScriptedStep>) -> Self {
        assert!(!steps.is_empty(), "ScriptedBackend requires at least one step");
        Self {
            platform_id: platform_id.into(),
            steps,
            cursor: AtomicUsize::new(0),
        }
    }

    /// A backend that always returns the same reply.
    pub fn always(platform_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(platform_id, vec![ScriptedStep::reply(text)])
    }

    pub fn calls(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentBackend for ScriptedBackend {
    async fn think(&self, _req: ThinkRequest) -> Result<ThinkReply, ThinkError> {
        let idx = self.cursor.fetch_add(1, Ordering::SeqCst);
        let step = &self.steps[idx.min(self.steps.len() - 1)];

        match step {
            ScriptedStep::Reply { text, delay } => {
                if !delay.is_zero() {
                    tokio::time::sleep(*delay).await;
                }
                Ok(ThinkReply {
                    text: text.clone(),
                    usage: Usage {
                        prompt_tokens: 10,
                        completion_tokens: text.split_whitespace().count() as u32,
                        total_tokens: 10 + text.split_whitespace().count() as u32,
                    },
                })
            }
            ScriptedStep::Error(err) => Err(err.clone()),
        }
    }

    fn platform_id(&self) -> &str {
        &self.platform_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req() -> ThinkRequest {
        ThinkRequest {
            room_id: "room-1".into(),
            system_prompt: "be helpful".into(),
            history: vec![],
            params: Default::default(),
        }
    }

    #[tokio::test]
    async fn returns_steps_in_order_then_repeats_last() {
        let backend = ScriptedBackend::new(
            "scripted-test",
            vec![ScriptedStep::reply("first"), ScriptedStep::reply("second")],
        );
        assert_eq!(backend.think(req()).await.unwrap().text, "first");
        assert_eq!(backend.think(req()).await.unwrap().text, "second");
        assert_eq!(backend.think(req()).await.unwrap().text, "second");
    }

    #[tokio::test]
    async fn error_step_surfaces_as_think_error() {
        let backend = ScriptedBackend::new(
            "scripted-test",
            vec![ScriptedStep::error(ThinkError::Timeout)],
        );
        let err = backend.think(req()).await.unwrap_err();
        assert_eq!(err, ThinkError::Timeout);
    }

    #[tokio::test]
    async fn calls_counts_invocations() {
        let backend = ScriptedBackend::always("scripted-test", "hi");
        backend.think(req()).await.unwrap();
        backend.think(req()).await.unwrap();
        assert_eq!(backend.calls(), 2);
    }
}
