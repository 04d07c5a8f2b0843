//! The per-room tick loop: `SVR -> decide -> think -> append -> emit`.
//!
//! Grounded on the teacher's `run_turn`/`run_turn_inner`: a single
//! `tokio::task` per room driving a bounded loop, with cancellation checked
//! before every await that can block on an agent, generalized here from
//! "tool loop" to the fixed SVR tick of spec §4.6.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex as SyncMutex;
use tokio::sync::mpsc;
use tokio::time::Instant;

use conclave_backend::{BackendRegistry, HistoryTurn, ThinkParams, ThinkReply, ThinkRequest};
use conclave_domain::config::EngineConfig;
use conclave_domain::think::ThinkError;
use conclave_domain::{AgentSpec, ContextView, Decision, DecisionAction, DiscussionContext, Phase, Speaker, SvrTuple, Turn};
use conclave_engine::{ParallelSvrEngine, SvrDecider};
use conclave_store::RoomStore;

use crate::cancel::CancelToken;
use crate::hub::protocol::{ClientOutbound, ControlCommand};
use crate::hub::ClientHub;

/// Commands a Controller's tick loop accepts from the outside.
pub enum ControllerCommand {
    UserMessage(String),
    Control(ControlCommand),
    /// A `Think` call's outcome, tagged with the tick it was launched for.
    /// When `tick_seq` no longer matches the loop's current tick — because
    /// the loop gave up waiting on it and substituted another agent, or the
    /// room moved on to a different phase — it arrives "late" and is still
    /// appended once if it landed successfully (see `append_late_reply`).
    ThinkResult {
        tick_seq: u64,
        agent_id: String,
        outcome: std::result::Result<ThinkReply, ThinkError>,
    },
}

enum ThinkOutcome {
    Ready(std::result::Result<ThinkReply, ThinkError>),
    TimedOut,
    Canceled(CancelReason),
}

/// Why `await_think_result` gave up waiting early — distinguishes a user
/// `pause` (room should end the tick `Paused` and stay resumable) from a
/// `stop` (room should proceed to `Stopping`/`Stopped`).
#[derive(Debug, Clone, Copy)]
enum CancelReason {
    Stopped,
    Paused,
}

pub struct ContinuousController {
    context: DiscussionContext,
    engine: ParallelSvrEngine,
    backends: Arc<BackendRegistry>,
    store: Arc<dyn RoomStore>,
    hub: Arc<ClientHub>,
    config: Arc<EngineConfig>,
    cancel: CancelToken,
    phase_handle: Arc<SyncMutex<Phase>>,
    command_rx: mpsc::Receiver<ControllerCommand>,
    command_tx: mpsc::Sender<ControllerCommand>,
    tick_seq: u64,
    sequence: u64,
}

impl ContinuousController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        context: DiscussionContext,
        engine: ParallelSvrEngine,
        backends: Arc<BackendRegistry>,
        store: Arc<dyn RoomStore>,
        hub: Arc<ClientHub>,
        config: Arc<EngineConfig>,
        cancel: CancelToken,
        phase_handle: Arc<SyncMutex<Phase>>,
        command_rx: mpsc::Receiver<ControllerCommand>,
        command_tx: mpsc::Sender<ControllerCommand>,
    ) -> Self {
        Self {
            context,
            engine,
            backends,
            store,
            hub,
            config,
            cancel,
            phase_handle,
            command_rx,
            command_tx,
            tick_seq: 0,
            sequence: 0,
        }
    }

    fn set_phase(&mut self, phase: Phase) -> bool {
        let ok = self.context.set_phase(phase);
        if ok {
            *self.phase_handle.lock() = phase;
        }
        ok
    }

    fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    async fn publish(&mut self, msg: ClientOutbound) {
        self.hub.publish(msg, self.config.discussion.publish_timeout()).await;
    }

    /// Runs until the room reaches `Phase::Stopped`. Consumes `self`.
    pub async fn run(mut self) {
        let room_id = self.context.room_id().to_string();
        loop {
            match self.context.phase() {
                Phase::Stopped => break,
                Phase::Idle | Phase::Paused => match self.command_rx.recv().await {
                    Some(cmd) => {
                        self.apply_command(cmd).await;
                    }
                    None => break,
                },
                Phase::Running => {
                    if self.drain_commands().await {
                        self.tick().await;
                    }
                }
                Phase::Stopping => {
                    self.drain_for_shutdown().await;
                    self.set_phase(Phase::Stopped);
                    self.emit_phase_changed().await;
                    break;
                }
            }
        }
        tracing::info!(room_id = %room_id, "controller stopped");
    }

    /// Non-blocking drain of queued commands while Running. Returns `false`
    /// if a command moved the room out of `Running` — the caller should
    /// re-evaluate the phase rather than tick.
    async fn drain_commands(&mut self) -> bool {
        loop {
            match self.command_rx.try_recv() {
                Ok(cmd) => {
                    if !self.apply_command(cmd).await {
                        return false;
                    }
                }
                Err(mpsc::error::TryRecvError::Empty) => return true,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    self.set_phase(Phase::Stopping);
                    return false;
                }
            }
        }
    }

    /// Applies one command. Returns `false` if the room is no longer
    /// `Running` afterward.
    async fn apply_command(&mut self, cmd: ControllerCommand) -> bool {
        match cmd {
            ControllerCommand::UserMessage(content) => {
                let turn_id = self.context.total_turns() + 1;
                let turn = Turn::user(self.context.room_id(), turn_id, content);
                self.append_and_persist(turn).await;
                if self.context.phase() != Phase::Running {
                    self.set_phase(Phase::Running);
                    self.emit_phase_changed().await;
                }
                true
            }
            ControllerCommand::Control(ControlCommand::Pause) => {
                self.set_phase(Phase::Paused);
                self.emit_phase_changed().await;
                false
            }
            ControllerCommand::Control(ControlCommand::Resume) => {
                self.set_phase(Phase::Running);
                self.emit_phase_changed().await;
                true
            }
            ControllerCommand::Control(ControlCommand::Stop) => {
                self.cancel.cancel();
                self.set_phase(Phase::Stopping);
                false
            }
            ControllerCommand::ThinkResult { outcome, agent_id, .. } => {
                if let Ok(reply) = outcome {
                    self.append_late_reply(agent_id, reply).await;
                }
                true
            }
        }
    }

    async fn emit_phase_changed(&mut self) {
        let room_id = self.context.room_id().to_string();
        let phase = self.context.phase();
        let sequence = self.next_sequence();
        self.publish(ClientOutbound::PhaseChanged { room_id, sequence, phase }).await;
    }

    /// Drains the command queue for up to `shutdownGrace`, appending one
    /// `Think` reply if it lands during that window, then gives up.
    async fn drain_for_shutdown(&mut self) {
        let deadline = Instant::now() + self.config.discussion.shutdown_grace();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return;
            }
            match tokio::time::timeout(remaining, self.command_rx.recv()).await {
                Ok(Some(ControllerCommand::ThinkResult {
                    outcome: Ok(reply),
                    agent_id,
                    ..
                })) => {
                    self.append_late_reply(agent_id, reply).await;
                    return;
                }
                Ok(Some(_)) => continue,
                Ok(None) | Err(_) => return,
            }
        }
    }

    async fn append_late_reply(&mut self, agent_id: String, reply: ThinkReply) {
        let turn_id = self.context.total_turns() + 1;
        let turn = Turn::agent(self.context.room_id(), turn_id, agent_id, reply.text, vec![], "late-think-result");
        self.append_and_persist(turn).await;
    }

    async fn append_and_persist(&mut self, turn: Turn) {
        let room_id = self.context.room_id().to_string();
        if let Err(e) = self.store.append_turn(&room_id, &turn) {
            tracing::warn!(room_id = %room_id, error = %e, "failed to persist turn");
        }
        self.context.append(turn.clone());
        self.publish(ClientOutbound::NewMessage { room_id, turn }).await;
    }

    /// One full tick: score every participant, decide, and (if `Continue`)
    /// produce one turn. Fixed event order: `svr_computed` -> `decision_made`
    /// -> (`turn_started` -> `turn_completed`|`turn_failed`, logged only) ->
    /// a phase-change event, if any.
    async fn tick(&mut self) {
        self.tick_seq += 1;
        let room_id = self.context.room_id().to_string();
        let view = self.context.snapshot();

        let scores = self.engine.compute(&view, &self.config.discussion).await;
        self.publish(ClientOutbound::SvrComputed {
            room_id: room_id.clone(),
            sequence: self.next_sequence(),
            scores: scores.clone(),
        })
        .await;

        let decision = SvrDecider::decide(&scores, &view, &self.config.discussion);
        self.publish(ClientOutbound::DecisionMade {
            room_id: room_id.clone(),
            sequence: self.next_sequence(),
            decision: decision.clone(),
        })
        .await;

        match decision.action {
            DecisionAction::Continue => self.run_agent_turn(decision, scores, &view).await,
            DecisionAction::Stop => {
                self.set_phase(Phase::Stopping);
                self.emit_phase_changed().await;
            }
            DecisionAction::Pause | DecisionAction::RedirectToUser => {
                self.set_phase(Phase::Paused);
                self.emit_phase_changed().await;
            }
        }
    }

    /// Runs `Think` for the decided agent, substituting the next-highest
    /// scoring eligible agent on a substitutable error up to
    /// `maxSubstitutionsPerRound` times, and degrading an agent whose error
    /// is permanent.
    async fn run_agent_turn(&mut self, mut decision: Decision, scores: Vec<SvrTuple>, view: &ContextView) {
        let room_id = self.context.room_id().to_string();
        let mut tried: HashSet<String> = HashSet::new();
        let mut substitutions = 0u32;

        loop {
            let Some(agent_id) = decision.selected_agent_id.clone() else {
                match decision.action {
                    DecisionAction::Stop => self.set_phase(Phase::Stopping),
                    _ => self.set_phase(Phase::Paused),
                };
                self.emit_phase_changed().await;
                return;
            };

            if self.cancel.is_cancelled() {
                self.set_phase(Phase::Stopping);
                return;
            }

            tried.insert(agent_id.clone());
            let Some(agent) = view.participants.iter().find(|a| a.agent_id == agent_id).cloned() else {
                tracing::warn!(room_id = %room_id, agent_id = %agent_id, "selected agent not found in roster");
                self.set_phase(Phase::Paused);
                self.emit_phase_changed().await;
                return;
            };

            let Some(backend) = self.backends.get(&agent.backend) else {
                tracing::warn!(
                    room_id = %room_id,
                    agent_id = %agent_id,
                    platform = %agent.backend,
                    "no backend registered for platform, degrading agent"
                );
                self.context.record_failure(&agent_id);
                decision = self.reselect(&scores, view, &tried);
                continue;
            };

            let request = self.build_think_request(&agent, view);
            let tick_seq = self.tick_seq;
            let tx = self.command_tx.clone();
            let agent_for_task = agent_id.clone();
            tracing::info!(room_id = %room_id, agent_id = %agent_id, "turn_started");
            tokio::spawn(async move {
                let outcome = backend.think(request).await;
                let _ = tx
                    .send(ControllerCommand::ThinkResult {
                        tick_seq,
                        agent_id: agent_for_task,
                        outcome,
                    })
                    .await;
            });

            let think_timeout = self.config.discussion.think_timeout();
            match self.await_think_result(tick_seq, &agent_id, think_timeout).await {
                ThinkOutcome::Ready(Ok(reply)) => {
                    tracing::info!(room_id = %room_id, agent_id = %agent_id, "turn_completed");
                    let turn_id = self.context.total_turns() + 1;
                    let turn = Turn::agent(&room_id, turn_id, agent_id, reply.text, scores, decision.reason.clone());
                    self.append_and_persist(turn).await;
                    return;
                }
                ThinkOutcome::Ready(Err(err)) => {
                    tracing::warn!(room_id = %room_id, agent_id = %agent_id, error = %err, "turn_failed");
                    if err.is_degrading() {
                        self.context.record_failure(&agent_id);
                    }
                    if !err.is_substitutable() || substitutions >= self.config.discussion.max_substitutions_per_round {
                        self.set_phase(Phase::Paused);
                        self.emit_phase_changed().await;
                        return;
                    }
                    substitutions += 1;
                    decision = self.reselect(&scores, view, &tried);
                }
                ThinkOutcome::TimedOut => {
                    tracing::warn!(room_id = %room_id, agent_id = %agent_id, "turn_failed: timeout");
                    if substitutions >= self.config.discussion.max_substitutions_per_round {
                        self.set_phase(Phase::Paused);
                        self.emit_phase_changed().await;
                        return;
                    }
                    substitutions += 1;
                    decision = self.reselect(&scores, view, &tried);
                }
                ThinkOutcome::Canceled(CancelReason::Stopped) => {
                    self.set_phase(Phase::Stopping);
                    return;
                }
                ThinkOutcome::Canceled(CancelReason::Paused) => {
                    // await_think_result already applied Phase::Paused; the
                    // in-flight reply (if any) still self-reports later and
                    // is appended as a late turn, per §4.6.
                    self.emit_phase_changed().await;
                    return;
                }
            }
        }
    }

    /// Re-runs the Decider excluding every agent already tried this tick, on
    /// top of the persistently degraded set, to pick the next-highest
    /// scoring eligible substitute.
    fn reselect(&self, scores: &[SvrTuple], view: &ContextView, tried: &HashSet<String>) -> Decision {
        let mut degraded = (*view.degraded).clone();
        degraded.extend(tried.iter().cloned());
        let mut sub_view = view.clone();
        sub_view.degraded = Arc::new(degraded);
        SvrDecider::decide(scores, &sub_view, &self.config.discussion)
    }

    /// Waits for the `ThinkResult` matching `(tick_seq, agent_id)`, applying
    /// any other command that arrives in the meantime. A stale reply that
    /// lands while we wait is appended immediately as a late turn.
    async fn await_think_result(&mut self, tick_seq: u64, agent_id: &str, timeout: Duration) -> ThinkOutcome {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return ThinkOutcome::TimedOut;
            }
            match tokio::time::timeout(remaining, self.command_rx.recv()).await {
                Ok(Some(ControllerCommand::ThinkResult { tick_seq: ts, agent_id: a, outcome }))
                    if ts == tick_seq && a == agent_id =>
                {
                    return ThinkOutcome::Ready(outcome);
                }
                Ok(Some(ControllerCommand::ThinkResult { outcome: Ok(reply), agent_id: a, .. })) => {
                    self.append_late_reply(a, reply).await;
                }
                Ok(Some(ControllerCommand::ThinkResult { .. })) => {}
                Ok(Some(ControllerCommand::Control(ControlCommand::Stop))) => {
                    self.cancel.cancel();
                    return ThinkOutcome::Canceled(CancelReason::Stopped);
                }
                Ok(Some(ControllerCommand::Control(ControlCommand::Pause))) => {
                    self.set_phase(Phase::Paused);
                    return ThinkOutcome::Canceled(CancelReason::Paused);
                }
                Ok(Some(ControllerCommand::Control(ControlCommand::Resume))) => {}
                Ok(Some(ControllerCommand::UserMessage(content))) => {
                    let turn_id = self.context.total_turns() + 1;
                    let turn = Turn::user(self.context.room_id(), turn_id, content);
                    self.append_and_persist(turn).await;
                }
                Ok(None) => return ThinkOutcome::Canceled(CancelReason::Stopped),
                Err(_elapsed) => return ThinkOutcome::TimedOut,
            }
        }
    }

    fn build_think_request(&self, agent: &AgentSpec, view: &ContextView) -> ThinkRequest {
        let mut history: Vec<HistoryTurn> = view
            .recent_window(self.config.discussion.history_window)
            .iter()
            .map(|t| HistoryTurn {
                speaker: match &t.speaker {
                    Speaker::User => "user".to_string(),
                    Speaker::Agent(id) => id.clone(),
                },
                content: t.content.clone(),
            })
            .collect();

        let budget = self.config.discussion.history_token_budget;
        while history.len() > 1
            && history.iter().map(|h| h.content.split_whitespace().count()).sum::<usize>() > budget
        {
            history.remove(0);
        }

        ThinkRequest {
            room_id: view.room_id.clone(),
            system_prompt: agent.system_prompt.clone(),
            history,
            params: ThinkParams {
                model: agent.model_params.model.clone(),
                temperature: agent.model_params.temperature,
                max_tokens: agent.model_params.max_tokens,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use conclave_backend::scripted::{ScriptedBackend, ScriptedStep};
    use conclave_domain::config::{DiscussionConfig, SvrWeights};
    use conclave_engine::SvrComputer;
    use conclave_store::FsRoomStore;

    use super::*;

    fn agent(id: &str, backend: &str) -> AgentSpec {
        AgentSpec::new(id, id, "debater", "be concise", backend)
    }

    fn test_config(overrides: DiscussionConfig) -> Arc<EngineConfig> {
        Arc::new(EngineConfig {
            discussion: overrides,
            ..EngineConfig::default()
        })
    }

    /// A harness bundling everything needed to construct a
    /// `ContinuousController` and drive it from a test.
    struct Harness {
        command_tx: mpsc::Sender<ControllerCommand>,
        phase_handle: Arc<SyncMutex<Phase>>,
        store: Arc<dyn RoomStore>,
        room_id: String,
        _tempdir: tempfile::TempDir,
    }

    impl Harness {
        fn build(room_id: &str, participants: Vec<AgentSpec>, backends: BackendRegistry, config: Arc<EngineConfig>) -> (Self, ContinuousController) {
            let tempdir = tempfile::tempdir().unwrap();
            let store = Arc::new(FsRoomStore::new(tempdir.path()).unwrap());
            store
                .create_room(&conclave_store::RoomManifest::new(room_id, "test room", participants.clone()))
                .unwrap();

            let context = DiscussionContext::new(room_id, participants);
            let engine = ParallelSvrEngine::new(Arc::new(SvrComputer::new(SvrWeights::default())));
            let hub = Arc::new(ClientHub::new());
            let cancel = CancelToken::new();
            let phase_handle = Arc::new(SyncMutex::new(Phase::Idle));
            let (tx, rx) = mpsc::channel(64);

            let controller = ContinuousController::new(
                context,
                engine,
                Arc::new(backends),
                store.clone() as Arc<dyn RoomStore>,
                hub,
                config,
                cancel,
                phase_handle.clone(),
                rx,
                tx.clone(),
            );

            (
                Harness {
                    command_tx: tx,
                    phase_handle,
                    store,
                    room_id: room_id.to_string(),
                    _tempdir: tempdir,
                },
                controller,
            )
        }

        fn phase(&self) -> Phase {
            *self.phase_handle.lock()
        }
    }

    /// S1: a lone agent talks until the turn budget is exhausted, then the
    /// room stops on its own with no client interaction.
    #[tokio::test]
    async fn single_agent_runs_to_budget_then_stops() {
        let participants = vec![agent("a", "backend-a")];
        let mut backends = BackendRegistry::empty();
        backends.insert("backend-a", Arc::new(ScriptedBackend::always("backend-a", "a reply")));

        // One user turn plus three agent turns (turn_ids 1..=4) before budget fires.
        let config = test_config(DiscussionConfig {
            max_turns: 4,
            min_rounds_before_stop: 1000,
            svr_deadline_ms: 500,
            think_timeout_ms: 2000,
            shutdown_grace_secs: 1,
            ..DiscussionConfig::default()
        });
        let (harness, controller) = Harness::build("room-s1", participants, backends, config);

        harness
            .command_tx
            .send(ControllerCommand::UserMessage("summarize causes of WWI".into()))
            .await
            .unwrap();

        tokio::time::timeout(StdDuration::from_secs(5), controller.run()).await.unwrap();

        let turns = harness.store.read_turns(&harness.room_id).unwrap();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns.iter().map(|t| t.turn_id).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert!(turns[0].speaker.is_user());
        assert!(turns[1..].iter().all(|t| t.speaker.as_agent_id() == Some("a")));
        assert_eq!(harness.phase(), Phase::Stopped);
    }

    /// A substitutable (`Timeout`) error never degrades the agent; the
    /// Decider just picks the next-best eligible agent within the same tick.
    #[tokio::test]
    async fn timeout_error_substitutes_within_round_without_degrading() {
        let participants = vec![agent("a", "backend-a"), agent("b", "backend-b")];
        let mut backends = BackendRegistry::empty();
        backends.insert(
            "backend-a",
            Arc::new(ScriptedBackend::new("backend-a", vec![ScriptedStep::error(ThinkError::Timeout)])),
        );
        backends.insert("backend-b", Arc::new(ScriptedBackend::always("backend-b", "b reply")));

        let config = test_config(DiscussionConfig {
            max_turns: 2,
            min_rounds_before_stop: 1000,
            svr_deadline_ms: 500,
            think_timeout_ms: 2000,
            shutdown_grace_secs: 1,
            ..DiscussionConfig::default()
        });
        let (harness, controller) = Harness::build("room-sub", participants, backends, config);

        harness
            .command_tx
            .send(ControllerCommand::UserMessage("go".into()))
            .await
            .unwrap();

        tokio::time::timeout(StdDuration::from_secs(5), controller.run()).await.unwrap();

        let turns = harness.store.read_turns(&harness.room_id).unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].speaker.as_agent_id(), Some("b"));
        assert_eq!(harness.phase(), Phase::Stopped);
    }

    /// S4 (single-agent slice): a `Permanent` error degrades the agent only
    /// on its second occurrence, and once the only participant is degraded
    /// the room pauses with reason `all-agents-failed` rather than spinning.
    #[tokio::test]
    async fn permanent_errors_degrade_after_second_occurrence_then_pause() {
        let participants = vec![agent("a", "backend-a")];
        let mut backends = BackendRegistry::empty();
        backends.insert(
            "backend-a",
            Arc::new(ScriptedBackend::new(
                "backend-a",
                vec![ScriptedStep::error(ThinkError::Permanent("down".into()))],
            )),
        );

        let config = test_config(DiscussionConfig {
            max_turns: 1000,
            min_rounds_before_stop: 1000,
            svr_deadline_ms: 500,
            think_timeout_ms: 2000,
            shutdown_grace_secs: 1,
            ..DiscussionConfig::default()
        });
        let (harness, controller) = Harness::build("room-degrade", participants, backends, config);
        let run_task = tokio::spawn(controller.run());

        harness
            .command_tx
            .send(ControllerCommand::UserMessage("go".into()))
            .await
            .unwrap();

        // First failure: recorded but not yet degraded, so the room just pauses.
        tokio::time::sleep(StdDuration::from_millis(100)).await;
        assert_eq!(harness.phase(), Phase::Paused);
        harness.command_tx.send(ControllerCommand::Control(ControlCommand::Resume)).await.unwrap();

        // Second failure: now degraded; still no other agent to substitute.
        tokio::time::sleep(StdDuration::from_millis(100)).await;
        assert_eq!(harness.phase(), Phase::Paused);
        harness.command_tx.send(ControllerCommand::Control(ControlCommand::Resume)).await.unwrap();

        // Decider now finds zero eligible agents and pauses outright.
        tokio::time::sleep(StdDuration::from_millis(100)).await;
        assert_eq!(harness.phase(), Phase::Paused);

        let turns = harness.store.read_turns(&harness.room_id).unwrap();
        assert_eq!(turns.len(), 1, "no agent turn was ever appended, only the user turn");

        run_task.abort();
    }

    /// S5: a client `pause` arriving while a `Think` is in flight leaves the
    /// room `Paused` (not `Stopped`), and the in-flight reply still lands as
    /// a late turn; `resume` afterward continues the loop.
    #[tokio::test]
    async fn pause_during_in_flight_think_preserves_reply_and_stays_resumable() {
        let participants = vec![agent("a", "backend-a")];
        let mut backends = BackendRegistry::empty();
        backends.insert(
            "backend-a",
            Arc::new(ScriptedBackend::new(
                "backend-a",
                vec![ScriptedStep::reply_after("slow reply", StdDuration::from_millis(150))],
            )),
        );

        let config = test_config(DiscussionConfig {
            max_turns: 1000,
            min_rounds_before_stop: 1000,
            svr_deadline_ms: 500,
            think_timeout_ms: 5000,
            shutdown_grace_secs: 1,
            ..DiscussionConfig::default()
        });
        let (harness, controller) = Harness::build("room-pause", participants, backends, config);
        let run_task = tokio::spawn(controller.run());

        harness.command_tx.send(ControllerCommand::UserMessage("go".into())).await.unwrap();
        tokio::time::sleep(StdDuration::from_millis(50)).await;
        harness.command_tx.send(ControllerCommand::Control(ControlCommand::Pause)).await.unwrap();

        // Let the in-flight think (150ms total) land and self-report.
        tokio::time::sleep(StdDuration::from_millis(250)).await;
        assert_eq!(harness.phase(), Phase::Paused);

        let turns = harness.store.read_turns(&harness.room_id).unwrap();
        assert_eq!(turns.len(), 2, "the in-flight reply is still appended once it lands");
        assert_eq!(turns[1].speaker.as_agent_id(), Some("a"));

        harness.command_tx.send(ControllerCommand::Control(ControlCommand::Resume)).await.unwrap();
        tokio::time::sleep(StdDuration::from_millis(50)).await;
        assert_eq!(harness.phase(), Phase::Running, "resume continues the loop from the current snapshot");

        run_task.abort();
    }
}
