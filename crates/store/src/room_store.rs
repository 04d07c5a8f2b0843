use conclave_domain::{Error, Result, Turn};

use crate::manifest::RoomManifest;

/// Persistence for room state. Mirrors `DiscussionContext` asynchronously
/// with at-least-once semantics — the Controller is the source of truth
/// while a room is active; `RoomStore` is for crash recovery and history.
pub trait RoomStore: Send + Sync {
    /// Create a room's on-disk layout and write its manifest. Errors if a
    /// room with this id already exists.
    fn create_room(&self, manifest: &RoomManifest) -> Result<()>;

    /// Load a room's manifest. `Error::RoomNotFound` if it doesn't exist.
    fn load_manifest(&self, room_id: &str) -> Result<RoomManifest>;

    /// Append one turn to the room's append-only log.
    fn append_turn(&self, room_id: &str, turn: &Turn) -> Result<()>;

    /// Read back all turns for a room, in append order. Tolerates a
    /// trailing partial (unterminated or truncated) line — the result of a
    /// crash mid-write — by discarding it silently.
    fn read_turns(&self, room_id: &str) -> Result<Vec<Turn>>;

    /// Permanently delete a room and all of its persisted turns.
    fn delete_room(&self, room_id: &str) -> Result<()>;

    /// List the ids of all rooms that have ever been created.
    fn list_rooms(&self) -> Result<Vec<String>>;
}

pub(crate) fn room_not_found(room_id: &str) -> Error {
    Error::RoomNotFound(room_id.to_string())
}
