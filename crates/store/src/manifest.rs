use chrono::{DateTime, Utc};
use conclave_domain::AgentSpec;
use serde::{Deserialize, Serialize};

/// The fixed metadata for a room, written once at creation and re-read on
/// every restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomManifest {
    pub room_id: String,
    pub room_name: String,
    pub created_at: DateTime<Utc>,
    pub participants: Vec<AgentSpec>,
}

impl RoomManifest {
    pub fn new(
        room_id: impl Into<String>,
        room_name: impl Into<String>,
        participants: Vec<AgentSpec>,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            room_name: room_name.into(),
            created_at: Utc::now(),
            participants,
        }
    }
}
