use serde::{Deserialize, Serialize};

/// Distinguishable per-agent SVR computation failure. An errored tuple
/// excludes the agent from selection but does not fail the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SvrError {
    Timeout,
    Panicked,
}

/// `{agentID, stop, value, repeat, latencyMs, error?}`. `stop`, `value`,
/// `repeat` are each in `[0, 1]` when `error` is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvrTuple {
    pub agent_id: String,
    pub stop: f64,
    pub value: f64,
    pub repeat: f64,
    pub latency_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<SvrError>,
}

impl SvrTuple {
    pub fn ok(agent_id: impl Into<String>, stop: f64, value: f64, repeat: f64, latency_ms: u64) -> Self {
        Self {
            agent_id: agent_id.into(),
            stop: stop.clamp(0.0, 1.0),
            value: value.clamp(0.0, 1.0),
            repeat: repeat.clamp(0.0, 1.0),
            latency_ms,
            error: None,
        }
    }

    pub fn errored(agent_id: impl Into<String>, error: SvrError, latency_ms: u64) -> Self {
        Self {
            agent_id: agent_id.into(),
            stop: 0.0,
            value: 0.0,
            repeat: 0.0,
            latency_ms,
            error: Some(error),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// `score = value * (1 - repeat) * (1 - 0.5*stop)`, used by the Decider's
    /// Continue rule. Undefined (returns 0.0) for errored tuples.
    pub fn continue_score(&self) -> f64 {
        if self.error.is_some() {
            return 0.0;
        }
        self.value * (1.0 - self.repeat) * (1.0 - 0.5 * self.stop)
    }
}
