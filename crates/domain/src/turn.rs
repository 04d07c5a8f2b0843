use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::svr::SvrTuple;

/// The speaker of a [`Turn`]: either the human user or a named agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Agent(String),
}

impl Speaker {
    pub fn as_agent_id(&self) -> Option<&str> {
        match self {
            Speaker::Agent(id) => Some(id),
            Speaker::User => None,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Speaker::User)
    }
}

/// One speech act. Append-only; never mutated once appended. `turn_id` is
/// monotonic per room; ordering across rooms is undefined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub turn_id: u64,
    pub room_id: String,
    pub speaker: Speaker,
    pub content: String,
    pub timestamp_utc: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub svr_snapshot: Option<Vec<SvrTuple>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub causing_decision_reason: Option<String>,
}

impl Turn {
    pub fn user(room_id: impl Into<String>, turn_id: u64, content: impl Into<String>) -> Self {
        Self {
            turn_id,
            room_id: room_id.into(),
            speaker: Speaker::User,
            content: content.into(),
            timestamp_utc: Utc::now(),
            svr_snapshot: None,
            causing_decision_reason: None,
        }
    }

    pub fn agent(
        room_id: impl Into<String>,
        turn_id: u64,
        agent_id: impl Into<String>,
        content: impl Into<String>,
        svr_snapshot: Vec<SvrTuple>,
        causing_decision_reason: impl Into<String>,
    ) -> Self {
        Self {
            turn_id,
            room_id: room_id.into(),
            speaker: Speaker::Agent(agent_id.into()),
            content: content.into(),
            timestamp_utc: Utc::now(),
            svr_snapshot: Some(svr_snapshot),
            causing_decision_reason: Some(causing_decision_reason.into()),
        }
    }
}
