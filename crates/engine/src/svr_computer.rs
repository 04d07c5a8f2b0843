use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use conclave_domain::config::{DiscussionConfig, SvrWeights};
use conclave_domain::context::{tokenize, Digest};
use conclave_domain::{AgentSpec, ContextView, SvrTuple};

/// EWMA smoothing factor for the `value` dimension's history-performance
/// component. Higher weights recent realizations more heavily.
const VALUE_EWMA_ALPHA: f64 = 0.3;

/// Computes SVR tuples for individual agents. CPU-only, no remote calls.
/// Holds per-agent rolling state (the `value` EWMA) across ticks, so one
/// instance is owned per room for the lifetime of its Controller.
pub struct SvrComputer {
    weights: SvrWeights,
    value_ewma: Mutex<HashMap<String, f64>>,
}

impl SvrComputer {
    pub fn new(weights: SvrWeights) -> Self {
        Self {
            weights,
            value_ewma: Mutex::new(HashMap::new()),
        }
    }

    /// Given `(AgentSpec, ContextView)`, produce an `SvrTuple`. Three
    /// dimensions are computed independently and clipped to `[0, 1]`.
    pub fn compute(&self, agent: &AgentSpec, view: &ContextView, config: &DiscussionConfig) -> SvrTuple {
        let start = Instant::now();
        let stop = self.compute_stop(agent, view, config);
        let value = self.compute_value(agent, view);
        let repeat = self.compute_repeat(agent, view);
        self.record_value_realization(&agent.agent_id, value);
        let latency_ms = start.elapsed().as_millis() as u64;
        SvrTuple::ok(agent.agent_id.clone(), stop, value, repeat, latency_ms)
    }

    fn record_value_realization(&self, agent_id: &str, value: f64) {
        let mut ewma = self.value_ewma.lock().unwrap();
        let entry = ewma.entry(agent_id.to_string()).or_insert(value);
        *entry = VALUE_EWMA_ALPHA * value + (1.0 - VALUE_EWMA_ALPHA) * *entry;
    }

    fn history_performance(&self, agent_id: &str) -> f64 {
        self.value_ewma
            .lock()
            .unwrap()
            .get(agent_id)
            .copied()
            .unwrap_or(0.5)
    }

    // ── stop ─────────────────────────────────────────────────────────

    fn compute_stop(&self, agent: &AgentSpec, view: &ContextView, config: &DiscussionConfig) -> f64 {
        let w = &self.weights.stop;

        let consensus_contribution = {
            let my_digest = view.content_digest(&agent.agent_id);
            let others: Vec<_> = view
                .participants
                .iter()
                .filter(|p| p.agent_id != agent.agent_id)
                .map(|p| view.content_digest(&p.agent_id))
                .filter(|d| !d.is_empty())
                .collect();
            if others.is_empty() || my_digest.is_empty() {
                0.5
            } else {
                let mean_disagreement: f64 = 1.0
                    - others.iter().map(|d| my_digest.jaccard(d)).sum::<f64>() / others.len() as f64;
                1.0 - mean_disagreement
            }
        };

        let soft_cap = (config.soft_cap_minimum as f64).max(2.0 * view.participants.len() as f64);
        let saturation = (view.round as f64 / soft_cap).min(1.0);

        let participation = view.participation_stats(10);
        let share = participation.get(&agent.agent_id).copied().unwrap_or(0.0);
        let fatigue = (share / 0.6).min(1.0);

        let global_stop_signal = 1.0 - speaker_entropy(view, 10);

        let time_factor = (view.elapsed().num_milliseconds().max(0) as f64
            / (config.max_duration_secs as f64 * 1000.0))
            .min(1.0);

        (w.consensus_contribution * consensus_contribution
            + w.saturation * saturation
            + w.fatigue * fatigue
            + w.global_stop_signal * global_stop_signal
            + w.time_factor * time_factor)
            .clamp(0.0, 1.0)
    }

    // ── value ────────────────────────────────────────────────────────

    fn compute_value(&self, agent: &AgentSpec, view: &ContextView) -> f64 {
        let w = &self.weights.value;

        let last_turns = view.last_turns_by(&agent.agent_id, 3);
        let turn_quality = if last_turns.is_empty() {
            0.5
        } else {
            let mut prior = Digest::default();
            let mut scores = Vec::new();
            for t in &last_turns {
                let len = t.content.chars().count();
                let len_score = if (40..=600).contains(&len) { 1.0 } else { 0.4 };
                let digest = Digest::from_text(&t.content);
                let dup_score = 1.0 - digest.jaccard(&prior);
                scores.push((len_score + dup_score) / 2.0);
                prior = prior.union(&digest);
            }
            scores.iter().sum::<f64>() / scores.len() as f64
        };

        let history_performance = self.history_performance(&agent.agent_id);

        let interaction_potential = match view
            .turns
            .iter()
            .rev()
            .position(|t| t.speaker.as_agent_id() == Some(agent.agent_id.as_str()))
        {
            None => 1.0,
            Some(gap) => {
                let n = view.participants.len().max(1);
                (1.0 - gap as f64 / n as f64).clamp(0.0, 1.0)
            }
        };

        let topical_relevance = match view.last_user_turn() {
            None => 0.5,
            Some(turn) => {
                let role_tokens: std::collections::HashSet<String> =
                    agent.role_tokens().into_iter().collect();
                let user_tokens: std::collections::HashSet<String> =
                    tokenize(&turn.content).into_iter().collect();
                jaccard_sets(&role_tokens, &user_tokens)
            }
        };

        (w.turn_quality * turn_quality
            + w.history_performance * history_performance
            + w.interaction_potential * interaction_potential
            + w.topical_relevance * topical_relevance)
            .clamp(0.0, 1.0)
    }

    // ── repeat ───────────────────────────────────────────────────────

    fn compute_repeat(&self, agent: &AgentSpec, view: &ContextView) -> f64 {
        let w = &self.weights.repeat;

        let last_turns = view.last_turns_by(&agent.agent_id, 4);
        let self_similarity = if last_turns.len() < 2 {
            0.0
        } else {
            let (last, prior) = last_turns.split_last().unwrap();
            let last_digest = Digest::from_text(&last.content);
            let prior_digest = Digest::from_texts(prior.iter().map(|t| t.content.as_str()));
            last_digest.jaccard(&prior_digest)
        };

        let pattern_repetition = if last_turns.len() < 2 {
            0.0
        } else {
            let n = last_turns.len();
            conclave_domain::context::trigram_overlap(
                &last_turns[n - 2].content,
                &last_turns[n - 1].content,
            )
        };

        let argument_recycling = match last_turns.last() {
            None => 0.0,
            Some(last) => {
                let last_digest = Digest::from_text(&last.content);
                let others: Vec<_> = view
                    .turns
                    .iter()
                    .filter(|t| !std::ptr::eq(t.as_ref(), last.as_ref()))
                    .collect();
                if others.is_empty() {
                    0.0
                } else {
                    others
                        .iter()
                        .map(|t| Digest::from_text(&t.content).jaccard(&last_digest))
                        .fold(0.0_f64, f64::max)
                }
            }
        };

        let participation = view.participation_stats(10);
        let frequency_risk = participation.get(&agent.agent_id).copied().unwrap_or(0.0);

        (w.self_similarity * self_similarity
            + w.pattern_repetition * pattern_repetition
            + w.argument_recycling * argument_recycling
            + w.frequency_risk * frequency_risk)
            .clamp(0.0, 1.0)
    }
}

fn jaccard_sets(a: &std::collections::HashSet<String>, b: &std::collections::HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let inter = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        inter as f64 / union as f64
    }
}

/// Normalized Shannon entropy (0..1) of the recent-speaker distribution.
/// Low entropy (few distinct repeated speakers) -> repetition -> high
/// `1 - entropy`, which is what `compute_stop` wants for the global-stop
/// signal.
fn speaker_entropy(view: &ContextView, window: usize) -> f64 {
    let recent = view.recent_window(window);
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut total = 0usize;
    for t in &recent {
        if let Some(id) = t.speaker.as_agent_id() {
            *counts.entry(id).or_insert(0) += 1;
            total += 1;
        }
    }
    if total == 0 || counts.len() <= 1 {
        return 0.0;
    }
    let entropy: f64 = counts
        .values()
        .map(|&c| {
            let p = c as f64 / total as f64;
            -p * p.ln()
        })
        .sum();
    let max_entropy = (counts.len() as f64).ln();
    if max_entropy == 0.0 {
        0.0
    } else {
        (entropy / max_entropy).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_domain::config::SvrWeights;
    use conclave_domain::{DiscussionContext, Turn};

    fn agent(id: &str) -> AgentSpec {
        AgentSpec::new(id, id, "debater", "discuss causes of WWI concisely", "scripted-test")
    }

    #[test]
    fn fresh_agent_gets_mid_range_scores_not_nan() {
        let mut ctx = DiscussionContext::new("room-1", vec![agent("a")]);
        ctx.append(Turn::user("room-1", 0, "Summarize causes of WWI"));
        let view = ctx.snapshot();
        let computer = SvrComputer::new(SvrWeights::default());
        let config = DiscussionConfig::default();
        let tuple = computer.compute(&agent("a"), &view, &config);
        assert!(tuple.is_valid());
        assert!((0.0..=1.0).contains(&tuple.stop));
        assert!((0.0..=1.0).contains(&tuple.value));
        assert!((0.0..=1.0).contains(&tuple.repeat));
    }

    #[test]
    fn repeated_identical_replies_raise_repeat_score() {
        let a = agent("a");
        let mut ctx = DiscussionContext::new("room-1", vec![a.clone()]);
        ctx.append(Turn::user("room-1", 0, "Summarize causes of WWI"));
        for _ in 0..3 {
            ctx.append(Turn::agent(
                "room-1",
                0,
                "a",
                "the alliance system caused escalation across Europe in 1914",
                vec![],
                "r",
            ));
        }
        let view = ctx.snapshot();
        let computer = SvrComputer::new(SvrWeights::default());
        let config = DiscussionConfig::default();
        let tuple = computer.compute(&a, &view, &config);
        assert!(tuple.repeat > 0.3);
    }

    #[test]
    fn agent_silent_for_a_while_gets_high_interaction_potential() {
        let a = agent("a");
        let b = agent("b");
        let mut ctx = DiscussionContext::new("room-1", vec![a.clone(), b.clone()]);
        ctx.append(Turn::user("room-1", 0, "topic"));
        ctx.append(Turn::agent("room-1", 0, "a", "opening remark from a", vec![], "r"));
        for _ in 0..4 {
            ctx.append(Turn::agent("room-1", 0, "b", "b keeps talking here", vec![], "r"));
        }
        let view = ctx.snapshot();
        let computer = SvrComputer::new(SvrWeights::default());
        let config = DiscussionConfig::default();
        let tuple_a = computer.compute(&a, &view, &config);
        let tuple_b = computer.compute(&b, &view, &config);
        assert!(tuple_a.value >= tuple_b.value - 0.5);
    }

    #[test]
    fn saturation_rises_toward_soft_cap() {
        let a = agent("a");
        let mut ctx = DiscussionContext::new("room-1", vec![a.clone()]);
        ctx.append(Turn::user("room-1", 0, "topic"));
        for i in 0..8 {
            ctx.append(Turn::agent("room-1", 0, "a", format!("reply number {i}"), vec![], "r"));
        }
        let view = ctx.snapshot();
        let computer = SvrComputer::new(SvrWeights::default());
        let config = DiscussionConfig::default();
        let tuple = computer.compute(&a, &view, &config);
        assert!(tuple.stop > 0.1);
    }
}
