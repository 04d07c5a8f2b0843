use conclave_domain::config::DiscussionConfig;
use conclave_domain::{ContextView, Decision, SvrTuple};

/// Maps an aggregated SVR table + context view to exactly one `Decision`.
/// Pure function of its inputs: same input -> same `Decision`.
pub struct SvrDecider;

impl SvrDecider {
    pub fn decide(scores: &[SvrTuple], view: &ContextView, config: &DiscussionConfig) -> Decision {
        let raw_scores = scores.to_vec();

        // Rule 1: hard stop on budget.
        if view.total_turns >= config.max_turns as u64
            || view.elapsed() >= chrono::Duration::seconds(config.max_duration_secs as i64)
        {
            return Decision::stop("budget", raw_scores);
        }

        let valid: Vec<&SvrTuple> = scores.iter().filter(|t| t.is_valid()).collect();

        // Rule 5: every tuple errored.
        if valid.is_empty() {
            return Decision::pause("all-agents-failed", raw_scores);
        }

        // Rule 2: consensus stop.
        let mean_stop: f64 = valid.iter().map(|t| t.stop).sum::<f64>() / valid.len() as f64;
        if mean_stop >= config.stop_threshold && view.round >= config.min_rounds_before_stop {
            return Decision::stop("consensus", raw_scores);
        }

        // Rule 3: quality floor.
        let max_value = valid.iter().map(|t| t.value).fold(f64::MIN, f64::max);
        if max_value < config.quality_floor && view.round >= config.min_rounds_before_stop {
            return Decision::redirect_to_user("low-value", raw_scores);
        }

        // Rule 4: continue with the top-scoring eligible (non-degraded) agent.
        let participation = view.participation_stats(10);
        let eligible: Vec<&SvrTuple> = valid
            .into_iter()
            .filter(|t| !view.degraded.contains(&t.agent_id))
            .collect();

        if eligible.is_empty() {
            return Decision::pause("all-agents-failed", raw_scores);
        }

        let best = eligible
            .into_iter()
            .max_by(|a, b| {
                a.continue_score()
                    .partial_cmp(&b.continue_score())
                    .unwrap()
                    .then_with(|| {
                        let pa = participation.get(&a.agent_id).copied().unwrap_or(0.0);
                        let pb = participation.get(&b.agent_id).copied().unwrap_or(0.0);
                        // lower recent participation wins ties -> reverse ordering
                        pb.partial_cmp(&pa).unwrap()
                    })
                    .then_with(|| b.agent_id.cmp(&a.agent_id))
            })
            .expect("eligible is non-empty");

        Decision::continue_with(best.agent_id.clone(), "top-score", raw_scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_domain::{AgentSpec, DiscussionContext, SvrError, Turn};

    fn view_with(participants: usize, total_turns: u64, round: u32) -> ContextView {
        let agents: Vec<_> = (0..participants)
            .map(|i| AgentSpec::new(format!("a{i}"), format!("a{i}"), "r", "p", "scripted-test"))
            .collect();
        let mut ctx = DiscussionContext::new("room-1", agents);
        ctx.append(Turn::user("room-1", 0, "hi"));
        for _ in 0..total_turns {
            ctx.append(Turn::agent("room-1", 0, "a0", "x", vec![], "r"));
        }
        let mut view = ctx.snapshot();
        view.round = round;
        view
    }

    #[test]
    fn hard_stop_on_max_turns() {
        let view = view_with(1, 50, 50);
        let config = DiscussionConfig {
            max_turns: 50,
            ..DiscussionConfig::default()
        };
        let scores = vec![SvrTuple::ok("a0", 0.1, 0.9, 0.1, 1)];
        let decision = SvrDecider::decide(&scores, &view, &config);
        assert_eq!(decision.reason, "budget");
    }

    #[test]
    fn consensus_stop_when_mean_stop_high_and_rounds_sufficient() {
        let view = view_with(1, 2, 4);
        let config = DiscussionConfig::default();
        let scores = vec![SvrTuple::ok("a0", 0.9, 0.5, 0.1, 1)];
        let decision = SvrDecider::decide(&scores, &view, &config);
        assert_eq!(decision.reason, "consensus");
    }

    #[test]
    fn quality_floor_redirects_to_user() {
        let view = view_with(1, 2, 4);
        let config = DiscussionConfig::default();
        let scores = vec![SvrTuple::ok("a0", 0.1, 0.05, 0.1, 1)];
        let decision = SvrDecider::decide(&scores, &view, &config);
        assert_eq!(decision.reason, "low-value");
    }

    #[test]
    fn continue_picks_max_score_agent() {
        let view = view_with(2, 1, 1);
        let config = DiscussionConfig::default();
        let scores = vec![
            SvrTuple::ok("a0", 0.1, 0.5, 0.1, 1),
            SvrTuple::ok("a1", 0.1, 0.9, 0.1, 1),
        ];
        let decision = SvrDecider::decide(&scores, &view, &config);
        assert_eq!(decision.selected_agent_id.as_deref(), Some("a1"));
        assert_eq!(decision.reason, "top-score");
    }

    #[test]
    fn ties_broken_by_lowest_participation_then_agent_id() {
        let view = view_with(2, 1, 1);
        let config = DiscussionConfig::default();
        let scores = vec![
            SvrTuple::ok("a0", 0.1, 0.5, 0.1, 1),
            SvrTuple::ok("a1", 0.1, 0.5, 0.1, 1),
        ];
        let decision = SvrDecider::decide(&scores, &view, &config);
        // a0 spoke most recently (1 agent turn attributed to a0 in view_with),
        // so a1 has lower recent participation and should win the tie.
        assert_eq!(decision.selected_agent_id.as_deref(), Some("a1"));
    }

    #[test]
    fn all_errored_tuples_yield_pause() {
        let view = view_with(1, 1, 1);
        let config = DiscussionConfig::default();
        let scores = vec![SvrTuple::errored("a0", SvrError::Timeout, 1600)];
        let decision = SvrDecider::decide(&scores, &view, &config);
        assert_eq!(decision.reason, "all-agents-failed");
    }

    #[test]
    fn degraded_agent_excluded_even_with_best_score() {
        let mut view = view_with(2, 1, 1);
        let mut degraded = std::collections::HashSet::new();
        degraded.insert("a1".to_string());
        view.degraded = std::sync::Arc::new(degraded);
        let config = DiscussionConfig::default();
        let scores = vec![
            SvrTuple::ok("a0", 0.1, 0.3, 0.1, 1),
            SvrTuple::ok("a1", 0.1, 0.99, 0.1, 1),
        ];
        let decision = SvrDecider::decide(&scores, &view, &config);
        assert_eq!(decision.selected_agent_id.as_deref(), Some("a0"));
    }

    #[test]
    fn decide_is_deterministic_given_same_inputs() {
        let view = view_with(2, 1, 1);
        let config = DiscussionConfig::default();
        let scores = vec![
            SvrTuple::ok("a0", 0.1, 0.5, 0.1, 1),
            SvrTuple::ok("a1", 0.1, 0.9, 0.1, 1),
        ];
        let d1 = SvrDecider::decide(&scores, &view, &config);
        let d2 = SvrDecider::decide(&scores, &view, &config);
        assert_eq!(d1.action, d2.action);
        assert_eq!(d1.selected_agent_id, d2.selected_agent_id);
        assert_eq!(d1.reason, d2.reason);
    }
}
