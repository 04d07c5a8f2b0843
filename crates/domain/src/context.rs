use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::AgentSpec;
use crate::turn::{Speaker, Turn};

/// Lifecycle state of a Controller. Transitions are monotonic within a
/// session: `Idle -> Running -> (Paused <-> Running)* -> Stopping -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Running,
    Paused,
    Stopping,
    Stopped,
}

impl Phase {
    /// Whether transitioning from `self` to `next` is a legal edge in the
    /// phase graph of §4.6.
    pub fn can_transition_to(self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (Idle, Running)
                | (Running, Paused)
                | (Paused, Running)
                | (Running, Stopping)
                | (Paused, Stopping)
                | (Stopping, Stopped)
        )
    }
}

/// A normalized token multiset over an agent's recent turns, used by SVR
/// for Jaccard-style overlap measurements. Represented as a set: two turns
/// sharing a repeated word count as one shared token, a simplification of
/// "multiset" that keeps Jaccard well-defined and cheap to recompute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Digest(pub HashSet<String>);

impl Digest {
    pub fn from_text(text: &str) -> Self {
        Digest(tokenize(text).into_iter().collect())
    }

    pub fn from_texts<'a>(texts: impl Iterator<Item = &'a str>) -> Self {
        let mut set = HashSet::new();
        for t in texts {
            set.extend(tokenize(t));
        }
        Digest(set)
    }

    pub fn union(&self, other: &Digest) -> Digest {
        Digest(self.0.union(&other.0).cloned().collect())
    }

    pub fn jaccard(&self, other: &Digest) -> f64 {
        if self.0.is_empty() && other.0.is_empty() {
            return 1.0;
        }
        let inter = self.0.intersection(&other.0).count();
        let union = self.0.union(&other.0).count();
        if union == 0 {
            0.0
        } else {
            inter as f64 / union as f64
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Lowercase whitespace/punctuation tokenizer shared by digesting and
/// role/topic relevance scoring.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

/// 3-gram overlap ratio between two texts (count of shared trigrams over
/// the smaller trigram count), used by the `repeat` signal's
/// pattern-repetition component.
pub fn trigram_overlap(a: &str, b: &str) -> f64 {
    let ta = trigrams(a);
    let tb = trigrams(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let shared = ta.intersection(&tb).count();
    let smaller = ta.len().min(tb.len());
    shared as f64 / smaller as f64
}

fn trigrams(text: &str) -> HashSet<(String, String, String)> {
    let toks = tokenize(text);
    let mut set = HashSet::new();
    for w in toks.windows(3) {
        set.insert((w[0].clone(), w[1].clone(), w[2].clone()));
    }
    set
}

/// A read-only, cheap-to-copy view of a [`DiscussionContext`]: shallow
/// refs to immutable turns plus primitive counters. Never mutates.
#[derive(Debug, Clone)]
pub struct ContextView {
    pub room_id: String,
    pub turns: Arc<Vec<Arc<Turn>>>,
    pub participants: Arc<Vec<AgentSpec>>,
    pub phase: Phase,
    pub round: u32,
    pub total_turns: u64,
    pub started_at: DateTime<Utc>,
    pub last_user_input_at: Option<DateTime<Utc>>,
    pub degraded: Arc<HashSet<String>>,
}

impl ContextView {
    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }

    pub fn recent_window(&self, k: usize) -> Vec<Arc<Turn>> {
        let len = self.turns.len();
        let start = len.saturating_sub(k);
        self.turns[start..].to_vec()
    }

    pub fn last_agent_turn(&self, agent_id: &str) -> Option<Arc<Turn>> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.speaker.as_agent_id() == Some(agent_id))
            .cloned()
    }

    pub fn last_turns_by(&self, agent_id: &str, n: usize) -> Vec<Arc<Turn>> {
        self.turns
            .iter()
            .rev()
            .filter(|t| t.speaker.as_agent_id() == Some(agent_id))
            .take(n)
            .rev()
            .cloned()
            .collect()
    }

    pub fn last_user_turn(&self) -> Option<Arc<Turn>> {
        self.turns.iter().rev().find(|t| t.speaker.is_user()).cloned()
    }

    /// Fraction of the last `window` turns spoken by each agent.
    pub fn participation_stats(&self, window: usize) -> HashMap<String, f64> {
        let recent = self.recent_window(window);
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut total = 0usize;
        for t in &recent {
            if let Some(agent_id) = t.speaker.as_agent_id() {
                *counts.entry(agent_id.to_string()).or_insert(0) += 1;
                total += 1;
            }
        }
        let mut stats = HashMap::new();
        for p in self.participants.iter() {
            let c = counts.get(&p.agent_id).copied().unwrap_or(0);
            let ratio = if total == 0 { 0.0 } else { c as f64 / total as f64 };
            stats.insert(p.agent_id.clone(), ratio);
        }
        stats
    }

    /// Normalized token digest over an agent's last 3 turns.
    pub fn content_digest(&self, agent_id: &str) -> Digest {
        let turns = self.last_turns_by(agent_id, 3);
        Digest::from_texts(turns.iter().map(|t| t.content.as_str()))
    }

    /// Mean per-turn length across all turns (chars), used diagnostically.
    pub fn mean_turn_length(&self) -> f64 {
        if self.turns.is_empty() {
            return 0.0;
        }
        let total: usize = self.turns.iter().map(|t| t.content.chars().count()).sum();
        total as f64 / self.turns.len() as f64
    }
}

/// One per active room. Owns the append-only turn log plus derived
/// participation/quality metrics and the current phase. `Append` and
/// `Snapshot` are the only mutation/read seams; all derived statistics are
/// deterministic functions of `turns`.
#[derive(Debug, Clone)]
pub struct DiscussionContext {
    room_id: String,
    turns: Vec<Arc<Turn>>,
    participants: Vec<AgentSpec>,
    phase: Phase,
    round: u32,
    started_at: DateTime<Utc>,
    last_user_input_at: Option<DateTime<Utc>>,
    degraded: HashSet<String>,
    failure_counts: HashMap<String, u32>,
}

/// A degrading error is only fatal to an agent after this many occurrences
/// within one session — a single permanent failure still gets substituted
/// for, matching §4.6/§8's "degraded after repeated permanent failures".
const DEGRADE_AFTER_FAILURES: u32 = 2;

impl DiscussionContext {
    pub fn new(room_id: impl Into<String>, participants: Vec<AgentSpec>) -> Self {
        Self {
            room_id: room_id.into(),
            turns: Vec::new(),
            participants,
            phase: Phase::Idle,
            round: 0,
            started_at: Utc::now(),
            last_user_input_at: None,
            degraded: HashSet::new(),
            failure_counts: HashMap::new(),
        }
    }

    /// Reconstruct a context from a previously-persisted turn log (crash
    /// recovery path, §8 S6). Phase is always `Idle`; `round` is recomputed
    /// as the count of agent turns since the last user turn.
    pub fn from_turns(room_id: impl Into<String>, participants: Vec<AgentSpec>, turns: Vec<Turn>) -> Self {
        let mut ctx = Self::new(room_id, participants);
        let round = turns
            .iter()
            .rev()
            .take_while(|t| !t.speaker.is_user())
            .count();
        ctx.last_user_input_at = turns.iter().rev().find(|t| t.speaker.is_user()).map(|t| t.timestamp_utc);
        ctx.turns = turns.into_iter().map(Arc::new).collect();
        ctx.round = round as u32;
        ctx
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn total_turns(&self) -> u64 {
        self.turns.len() as u64
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn participants(&self) -> &[AgentSpec] {
        &self.participants
    }

    /// Assigns the next turnID; O(1); single-threaded inside its Controller.
    pub fn append(&mut self, mut turn: Turn) -> u64 {
        let turn_id = self.turns.len() as u64 + 1;
        turn.turn_id = turn_id;
        let is_user = turn.speaker.is_user();
        if is_user {
            self.round = 0;
            self.last_user_input_at = Some(turn.timestamp_utc);
        } else {
            self.round += 1;
        }
        self.turns.push(Arc::new(turn));
        turn_id
    }

    pub fn set_phase(&mut self, phase: Phase) -> bool {
        if self.phase.can_transition_to(phase) {
            self.phase = phase;
            true
        } else {
            false
        }
    }

    pub fn mark_degraded(&mut self, agent_id: &str) {
        self.degraded.insert(agent_id.to_string());
    }

    pub fn is_degraded(&self, agent_id: &str) -> bool {
        self.degraded.contains(agent_id)
    }

    /// Records one degrading failure for `agent_id`; marks it degraded once
    /// it has accumulated `DEGRADE_AFTER_FAILURES` of them. Returns whether
    /// this call is what pushed the agent into `degraded`.
    pub fn record_failure(&mut self, agent_id: &str) -> bool {
        let count = self.failure_counts.entry(agent_id.to_string()).or_insert(0);
        *count += 1;
        if *count >= DEGRADE_AFTER_FAILURES {
            self.mark_degraded(agent_id);
            true
        } else {
            false
        }
    }

    /// Returns a read-only, cheap-to-copy view. Never mutates.
    pub fn snapshot(&self) -> ContextView {
        ContextView {
            room_id: self.room_id.clone(),
            turns: Arc::new(self.turns.clone()),
            participants: Arc::new(self.participants.clone()),
            phase: self.phase,
            round: self.round,
            total_turns: self.total_turns(),
            started_at: self.started_at,
            last_user_input_at: self.last_user_input_at,
            degraded: Arc::new(self.degraded.clone()),
        }
    }

    pub fn turns(&self) -> &[Arc<Turn>] {
        &self.turns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: &str) -> AgentSpec {
        AgentSpec::new(id, id, "debater", "be concise", "scripted-test")
    }

    #[test]
    fn append_assigns_monotonic_turn_ids() {
        let mut ctx = DiscussionContext::new("room-1", vec![agent("a")]);
        let id1 = ctx.append(Turn::user("room-1", 0, "hello"));
        let id2 = ctx.append(Turn::agent("room-1", 0, "a", "hi", vec![], "top-score"));
        assert_eq!(id1, 1);
        assert_eq!(id2, 2);
    }

    #[test]
    fn user_turn_resets_round_agent_turn_increments() {
        let mut ctx = DiscussionContext::new("room-1", vec![agent("a")]);
        ctx.append(Turn::user("room-1", 0, "hi"));
        ctx.append(Turn::agent("room-1", 0, "a", "hi", vec![], "r"));
        ctx.append(Turn::agent("room-1", 0, "a", "hi2", vec![], "r"));
        assert_eq!(ctx.round(), 2);
        ctx.append(Turn::user("room-1", 0, "follow up"));
        assert_eq!(ctx.round(), 0);
    }

    #[test]
    fn phase_transitions_follow_legal_graph() {
        let mut ctx = DiscussionContext::new("room-1", vec![]);
        assert!(ctx.set_phase(Phase::Running));
        assert!(ctx.set_phase(Phase::Paused));
        assert!(ctx.set_phase(Phase::Running));
        assert!(ctx.set_phase(Phase::Stopping));
        assert!(ctx.set_phase(Phase::Stopped));
        assert!(!ctx.set_phase(Phase::Running));
    }

    #[test]
    fn snapshot_is_a_cheap_copy_not_affected_by_later_appends() {
        let mut ctx = DiscussionContext::new("room-1", vec![agent("a")]);
        ctx.append(Turn::user("room-1", 0, "hi"));
        let snap = ctx.snapshot();
        ctx.append(Turn::agent("room-1", 0, "a", "hi", vec![], "r"));
        assert_eq!(snap.turns.len(), 1);
        assert_eq!(ctx.total_turns(), 2);
    }

    #[test]
    fn participation_stats_ratio_over_window() {
        let mut ctx = DiscussionContext::new("room-1", vec![agent("a"), agent("b")]);
        ctx.append(Turn::user("room-1", 0, "hi"));
        for _ in 0..3 {
            ctx.append(Turn::agent("room-1", 0, "a", "x", vec![], "r"));
        }
        ctx.append(Turn::agent("room-1", 0, "b", "y", vec![], "r"));
        let snap = ctx.snapshot();
        let stats = snap.participation_stats(10);
        assert!((stats["a"] - 0.75).abs() < 1e-9);
        assert!((stats["b"] - 0.25).abs() < 1e-9);
    }

    #[test]
    fn digest_jaccard_identical_texts_is_one() {
        let d1 = Digest::from_text("the quick brown fox");
        let d2 = Digest::from_text("the quick brown fox");
        assert_eq!(d1.jaccard(&d2), 1.0);
    }

    #[test]
    fn digest_jaccard_disjoint_texts_is_zero() {
        let d1 = Digest::from_text("alpha beta");
        let d2 = Digest::from_text("gamma delta");
        assert_eq!(d1.jaccard(&d2), 0.0);
    }

    #[test]
    fn trigram_overlap_detects_near_duplicate_sentences() {
        let a = "the quick brown fox jumps over the lazy dog";
        let b = "the quick brown fox jumps over the lazy cat";
        assert!(trigram_overlap(a, b) > 0.5);
    }

    #[test]
    fn agent_degrades_only_after_second_failure() {
        let mut ctx = DiscussionContext::new("room-1", vec![agent("a")]);
        assert!(!ctx.record_failure("a"));
        assert!(!ctx.is_degraded("a"));
        assert!(ctx.record_failure("a"));
        assert!(ctx.is_degraded("a"));
    }

    #[test]
    fn from_turns_reconstructs_round_since_last_user_turn() {
        let turns = vec![
            Turn::user("room-1", 1, "hi"),
            Turn::agent("room-1", 2, "a", "x", vec![], "r"),
            Turn::agent("room-1", 3, "a", "y", vec![], "r"),
        ];
        let ctx = DiscussionContext::from_turns("room-1", vec![agent("a")], turns);
        assert_eq!(ctx.total_turns(), 3);
        assert_eq!(ctx.round(), 2);
        assert_eq!(ctx.phase(), Phase::Idle);
    }
}
