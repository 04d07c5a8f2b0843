//! `RoomStore`: persistence for room manifests and append-only turn logs.

pub mod fs;
pub mod manifest;
pub mod room_store;

pub use fs::FsRoomStore;
pub use manifest::RoomManifest;
pub use room_store::RoomStore;
