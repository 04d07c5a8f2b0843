use std::sync::Arc;
use std::time::{Duration, Instant};

use conclave_domain::config::DiscussionConfig;
use conclave_domain::{AgentSpec, ContextView, SvrError, SvrTuple};

use crate::svr_computer::SvrComputer;

/// Fans out `SvrComputer` across all participants concurrently, aggregating
/// results under a global deadline. Never blocks the Controller's event
/// handling beyond `svrDeadline`.
pub struct ParallelSvrEngine {
    computer: Arc<SvrComputer>,
}

impl ParallelSvrEngine {
    pub fn new(computer: Arc<SvrComputer>) -> Self {
        Self { computer }
    }

    /// Returns in insertion order of participants; result count always
    /// equals `len(participants)`. All participants race a single deadline
    /// measured from the start of this call — a slow or stuck participant
    /// never pushes the wall-clock past `svrDeadline + ε` regardless of how
    /// many other participants are also slow.
    pub async fn compute(&self, view: &ContextView, config: &DiscussionConfig) -> Vec<SvrTuple> {
        let deadline = config.svr_deadline();
        let participants: Vec<AgentSpec> = view.participants.as_ref().clone();

        let tasks: Vec<_> = participants
            .into_iter()
            .map(|agent| {
                let computer = self.computer.clone();
                let view = view.clone();
                let config = config.clone();
                tokio::task::spawn_blocking(move || computer.compute(&agent, &view, &config))
            })
            .collect();

        let started = Instant::now();
        match tokio::time::timeout(deadline, futures_util::future::join_all(tasks)).await {
            Ok(results) => view
                .participants
                .iter()
                .zip(results)
                .map(|(agent, result)| match result {
                    Ok(tuple) => tuple,
                    Err(_join_err) => SvrTuple::errored(
                        agent.agent_id.clone(),
                        SvrError::Panicked,
                        started.elapsed().as_millis() as u64,
                    ),
                })
                .collect(),
            Err(_elapsed) => view
                .participants
                .iter()
                .map(|agent| {
                    SvrTuple::errored(agent.agent_id.clone(), SvrError::Timeout, deadline.as_millis() as u64)
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_domain::config::SvrWeights;
    use conclave_domain::{DiscussionContext, Turn};

    fn agent(id: &str) -> AgentSpec {
        AgentSpec::new(id, id, "debater", "discuss", "scripted-test")
    }

    #[tokio::test]
    async fn returns_exactly_len_participants_tuples_in_order() {
        let mut ctx = DiscussionContext::new("room-1", vec![agent("a"), agent("b"), agent("c")]);
        ctx.append(Turn::user("room-1", 0, "topic"));
        let view = ctx.snapshot();
        let engine = ParallelSvrEngine::new(Arc::new(SvrComputer::new(SvrWeights::default())));
        let config = DiscussionConfig::default();
        let tuples = engine.compute(&view, &config).await;
        assert_eq!(tuples.len(), 3);
        assert_eq!(tuples[0].agent_id, "a");
        assert_eq!(tuples[1].agent_id, "b");
        assert_eq!(tuples[2].agent_id, "c");
    }

    #[tokio::test]
    async fn completes_well_within_svr_deadline() {
        let mut ctx = DiscussionContext::new("room-1", vec![agent("a")]);
        ctx.append(Turn::user("room-1", 0, "topic"));
        let view = ctx.snapshot();
        let engine = ParallelSvrEngine::new(Arc::new(SvrComputer::new(SvrWeights::default())));
        let config = DiscussionConfig::default();
        let start = Instant::now();
        let tuples = engine.compute(&view, &config).await;
        assert!(tuples[0].is_valid());
        assert!(start.elapsed() < Duration::from_millis(1500));
    }

    /// Several participants compute concurrently under one shared deadline:
    /// wall-clock must stay near a single `svrDeadline`, not scale with the
    /// number of participants (each sequentially re-arming its own timeout
    /// would instead cost up to N * svrDeadline).
    #[tokio::test]
    async fn many_participants_share_one_deadline_not_one_each() {
        let agents: Vec<_> = (0..8).map(|i| agent(&format!("agent-{i}"))).collect();
        let mut ctx = DiscussionContext::new("room-1", agents);
        ctx.append(Turn::user("room-1", 0, "topic"));
        let view = ctx.snapshot();
        let engine = ParallelSvrEngine::new(Arc::new(SvrComputer::new(SvrWeights::default())));
        let config = DiscussionConfig::default();
        let start = Instant::now();
        let tuples = engine.compute(&view, &config).await;
        assert_eq!(tuples.len(), 8);
        assert!(tuples.iter().all(|t| t.is_valid()));
        assert!(start.elapsed() < config.svr_deadline() + Duration::from_millis(200));
    }
}
