use serde::{Deserialize, Serialize};

use crate::svr::SvrTuple;

/// The action the `SVRDecider` has chosen for the current tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    Continue,
    Stop,
    Pause,
    RedirectToUser,
}

/// `{action, selectedAgentID?, reason, rawScores}`. Output of one
/// `SVRDecider::decide` call; a pure function of its inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub action: DecisionAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_agent_id: Option<String>,
    pub reason: String,
    pub raw_scores: Vec<SvrTuple>,
}

impl Decision {
    pub fn continue_with(agent_id: impl Into<String>, reason: impl Into<String>, raw_scores: Vec<SvrTuple>) -> Self {
        Self {
            action: DecisionAction::Continue,
            selected_agent_id: Some(agent_id.into()),
            reason: reason.into(),
            raw_scores,
        }
    }

    pub fn stop(reason: impl Into<String>, raw_scores: Vec<SvrTuple>) -> Self {
        Self {
            action: DecisionAction::Stop,
            selected_agent_id: None,
            reason: reason.into(),
            raw_scores,
        }
    }

    pub fn pause(reason: impl Into<String>, raw_scores: Vec<SvrTuple>) -> Self {
        Self {
            action: DecisionAction::Pause,
            selected_agent_id: None,
            reason: reason.into(),
            raw_scores,
        }
    }

    pub fn redirect_to_user(reason: impl Into<String>, raw_scores: Vec<SvrTuple>) -> Self {
        Self {
            action: DecisionAction::RedirectToUser,
            selected_agent_id: None,
            reason: reason.into(),
            raw_scores,
        }
    }
}
