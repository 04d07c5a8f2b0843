use serde::Serialize;

/// Structured trace events emitted across all conclave crates. Each variant
/// is logged via `tracing::info!` with the serialized event as a single
/// structured field, mirroring how ad-hoc `tracing` calls are sprinkled
/// through the gateway but giving cross-cutting events one stable shape.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    RoomStarted {
        room_id: String,
        participant_count: usize,
    },
    RoomStopped {
        room_id: String,
        reason: String,
        total_turns: u64,
    },
    SvrComputed {
        room_id: String,
        round: u32,
        duration_ms: u64,
        valid_count: usize,
        error_count: usize,
    },
    DecisionMade {
        room_id: String,
        action: String,
        selected_agent_id: Option<String>,
        reason: String,
    },
    ThinkCalled {
        room_id: String,
        agent_id: String,
        platform: String,
        duration_ms: u64,
        outcome: String,
    },
    AgentDegraded {
        room_id: String,
        agent_id: String,
        permanent_failures: u32,
    },
    PersistenceDegraded {
        room_id: String,
        lag_turns: u64,
    },
    ClientDropped {
        room_id: String,
        connection_id: String,
        reason: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "conclave_event");
    }
}
