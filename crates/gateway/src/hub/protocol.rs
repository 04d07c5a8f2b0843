//! The closed wire protocol spoken over `/ws`.
//!
//! Inbound frames are tagged `{"type": "...", ...}` and deserialize into
//! [`ClientInbound`]; outbound frames deserialize the same way into
//! [`ClientOutbound`]. Both are closed sum types — an unrecognized `type`
//! fails to parse rather than silently matching a catch-all variant.

use conclave_domain::{AgentSpec, Decision, Phase, SvrTuple, Turn};
use serde::{Deserialize, Serialize};

/// A command sent by a connected client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientInbound {
    CreateRoom {
        room_name: String,
        agents: Vec<AgentSpecWire>,
    },
    JoinRoom {
        room_id: String,
    },
    SendMessage {
        room_id: String,
        content: String,
    },
    GetRoomHistory {
        room_id: String,
    },
    DeleteRoom {
        room_id: String,
    },
    GetRooms,
    DiscussionControl {
        room_id: String,
        command: ControlCommand,
    },
}

/// Pause/resume/stop a running discussion. `Start` is not here — starting a
/// room is a distinct operation (`FrameworkManager::start`) from controlling
/// one already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlCommand {
    Pause,
    Resume,
    Stop,
}

/// Wire shape of an agent, as supplied by a client creating a room. Maps to
/// [`AgentSpec`], renaming the wire's `platform` to the domain's `backend`.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSpecWire {
    pub agent_id: String,
    pub display_name: String,
    pub role: String,
    pub system_prompt: String,
    pub platform: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl From<AgentSpecWire> for AgentSpec {
    fn from(w: AgentSpecWire) -> Self {
        let mut spec = AgentSpec::new(w.agent_id, w.display_name, w.role, w.system_prompt, w.platform);
        spec.model_params.model = w.model;
        spec.model_params.temperature = w.temperature;
        spec.model_params.max_tokens = w.max_tokens;
        spec
    }
}

/// A single room's summary, used by `rooms_list` and the REST room listing.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSummary {
    pub room_id: String,
    pub room_name: String,
    pub phase: Phase,
    pub participant_count: usize,
}

/// An event pushed to connected clients. Each variant carries its own
/// `room_id`/`sequence` rather than wrapping a generic envelope, since the
/// set of variants is closed and each has a distinct payload shape anyway.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientOutbound {
    Connection {
        connection_id: String,
    },
    RoomsList {
        rooms: Vec<RoomSummary>,
    },
    RoomCreated {
        room_id: String,
        room_name: String,
    },
    RoomDeleted {
        room_id: String,
    },
    NewMessage {
        room_id: String,
        turn: Turn,
    },
    SvrComputed {
        room_id: String,
        sequence: u64,
        scores: Vec<SvrTuple>,
    },
    DecisionMade {
        room_id: String,
        sequence: u64,
        decision: Decision,
    },
    PhaseChanged {
        room_id: String,
        sequence: u64,
        phase: Phase,
    },
    Error {
        code: String,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        room_id: Option<String>,
    },
}
