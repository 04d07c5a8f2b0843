use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Engine — timeouts and budgets for the discussion orchestration loop
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// All configurable timing and budget knobs for the turn scheduler.
///
/// A single record read once at startup; the core loop never re-reads
/// config files — see [`super::EngineConfig::validate`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DiscussionConfig {
    /// Per-agent `Think` deadline, milliseconds.
    #[serde(default = "d_think_timeout_ms")]
    pub think_timeout_ms: u64,
    /// Deadline for one SVR scoring pass across all participants, milliseconds.
    #[serde(default = "d_svr_deadline_ms")]
    pub svr_deadline_ms: u64,
    /// Deadline for a single publish to a subscriber before it is dropped, milliseconds.
    #[serde(default = "d_publish_timeout_ms")]
    pub publish_timeout_ms: u64,
    /// Hard wall-clock budget for a room session, seconds.
    #[serde(default = "d_max_duration_secs")]
    pub max_duration_secs: u64,
    /// Hard turn-count budget for a room session.
    #[serde(default = "d_max_turns")]
    pub max_turns: u32,
    /// Time allowed for a Controller to reach Stopped during process shutdown, seconds.
    #[serde(default = "d_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
    /// Max turns of history passed to `Think` (bounded further by token budget).
    #[serde(default = "d_history_window")]
    pub history_window: usize,
    /// Approximate token budget for history passed to `Think`.
    #[serde(default = "d_history_token_budget")]
    pub history_token_budget: usize,
    /// Floor for the saturation soft-cap: `max(soft_cap_minimum, 2 * participants)`.
    #[serde(default = "d_soft_cap_minimum")]
    pub soft_cap_minimum: u32,
    /// Mean-stop threshold for the consensus-stop decision rule.
    #[serde(default = "d_stop_threshold")]
    pub stop_threshold: f64,
    /// Minimum rounds before consensus-stop / quality-floor rules may fire.
    #[serde(default = "d_min_rounds_before_stop")]
    pub min_rounds_before_stop: u32,
    /// Minimum max(value) below which the Decider redirects to the user.
    #[serde(default = "d_quality_floor")]
    pub quality_floor: f64,
    /// Max agent substitutions per round on Timeout/Transient errors.
    #[serde(default = "d_max_substitutions_per_round")]
    pub max_substitutions_per_round: u32,
    /// Turns of persistence lag tolerated before a `persistence_degraded` warning.
    #[serde(default = "d_persist_lag_cap")]
    pub persist_lag_cap: u64,
    /// Window (in turns) used by `ParticipationStats`.
    #[serde(default = "d_participation_window")]
    pub participation_window: usize,
}

impl Default for DiscussionConfig {
    fn default() -> Self {
        Self {
            think_timeout_ms: d_think_timeout_ms(),
            svr_deadline_ms: d_svr_deadline_ms(),
            publish_timeout_ms: d_publish_timeout_ms(),
            max_duration_secs: d_max_duration_secs(),
            max_turns: d_max_turns(),
            shutdown_grace_secs: d_shutdown_grace_secs(),
            history_window: d_history_window(),
            history_token_budget: d_history_token_budget(),
            soft_cap_minimum: d_soft_cap_minimum(),
            stop_threshold: d_stop_threshold(),
            min_rounds_before_stop: d_min_rounds_before_stop(),
            quality_floor: d_quality_floor(),
            max_substitutions_per_round: d_max_substitutions_per_round(),
            persist_lag_cap: d_persist_lag_cap(),
            participation_window: d_participation_window(),
        }
    }
}

impl DiscussionConfig {
    pub fn think_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.think_timeout_ms)
    }
    pub fn svr_deadline(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.svr_deadline_ms)
    }
    pub fn publish_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.publish_timeout_ms)
    }
    pub fn max_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.max_duration_secs)
    }
    pub fn shutdown_grace(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.shutdown_grace_secs)
    }
}

fn d_think_timeout_ms() -> u64 {
    30_000
}
fn d_svr_deadline_ms() -> u64 {
    1_500
}
fn d_publish_timeout_ms() -> u64 {
    100
}
fn d_max_duration_secs() -> u64 {
    3_600
}
fn d_max_turns() -> u32 {
    50
}
fn d_shutdown_grace_secs() -> u64 {
    5
}
fn d_history_window() -> usize {
    40
}
fn d_history_token_budget() -> usize {
    8_000
}
fn d_soft_cap_minimum() -> u32 {
    6
}
fn d_stop_threshold() -> f64 {
    0.80
}
fn d_min_rounds_before_stop() -> u32 {
    2
}
fn d_quality_floor() -> f64 {
    0.20
}
fn d_max_substitutions_per_round() -> u32 {
    2
}
fn d_persist_lag_cap() -> u64 {
    200
}
fn d_participation_window() -> usize {
    10
}
