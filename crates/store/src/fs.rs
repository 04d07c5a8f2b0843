//! Filesystem-backed `RoomStore`.
//!
//! One directory per room under the configured root: `manifest.json` plus
//! an append-only `turns.log` (one JSON `Turn` per line), grounded on the
//! teacher's JSON-file-backed session store and JSONL transcript writer.

use std::io::Write;
use std::path::{Path, PathBuf};

use conclave_domain::{Error, Result, Turn};
use parking_lot::Mutex;

use crate::manifest::RoomManifest;
use crate::room_store::{room_not_found, RoomStore};

pub struct FsRoomStore {
    root: PathBuf,
    /// Serializes append-to-turns.log per-process; a single Controller is
    /// the only writer for a given room, but this guards concurrent access
    /// from tests and administrative tools.
    write_lock: Mutex<()>,
}

impl FsRoomStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(Error::Io)?;
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    fn room_dir(&self, room_id: &str) -> PathBuf {
        self.root.join(room_id)
    }

    fn manifest_path(&self, room_id: &str) -> PathBuf {
        self.room_dir(room_id).join("manifest.json")
    }

    fn turns_path(&self, room_id: &str) -> PathBuf {
        self.room_dir(room_id).join("turns.log")
    }
}

impl RoomStore for FsRoomStore {
    fn create_room(&self, manifest: &RoomManifest) -> Result<()> {
        let dir = self.room_dir(&manifest.room_id);
        if dir.exists() {
            return Err(Error::RoomInvalid(format!(
                "room '{}' already exists on disk",
                manifest.room_id
            )));
        }
        std::fs::create_dir_all(&dir).map_err(Error::Io)?;

        let json = serde_json::to_string_pretty(manifest)?;
        std::fs::write(self.manifest_path(&manifest.room_id), json).map_err(Error::Io)?;

        // Create an empty turns log so readers never have to distinguish
        // "room exists, no turns yet" from "room doesn't exist".
        std::fs::File::create(self.turns_path(&manifest.room_id)).map_err(Error::Io)?;

        tracing::info!(room_id = %manifest.room_id, "room created on disk");
        Ok(())
    }

    fn load_manifest(&self, room_id: &str) -> Result<RoomManifest> {
        let path = self.manifest_path(room_id);
        if !path.exists() {
            return Err(room_not_found(room_id));
        }
        let raw = std::fs::read_to_string(&path).map_err(Error::Io)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn append_turn(&self, room_id: &str, turn: &Turn) -> Result<()> {
        let path = self.turns_path(room_id);
        if !self.room_dir(room_id).exists() {
            return Err(room_not_found(room_id));
        }

        let _guard = self.write_lock.lock();
        let line = serde_json::to_string(turn)?;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(Error::Io)?;
        writeln!(file, "{line}").map_err(Error::Io)?;
        Ok(())
    }

    fn read_turns(&self, room_id: &str) -> Result<Vec<Turn>> {
        let path = self.turns_path(room_id);
        if !path.exists() {
            return Err(room_not_found(room_id));
        }

        let raw = std::fs::read_to_string(&path).map_err(Error::Io)?;
        let mut lines: Vec<&str> = raw.lines().collect();

        // A trailing partial line (crash mid-write, no newline terminator)
        // is tolerated and silently discarded. Any other malformed line is
        // a real corruption and surfaces as an error.
        let mut trailing_partial: Option<&str> = None;
        if !raw.ends_with('\n') {
            trailing_partial = lines.pop();
        }

        let mut turns = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let turn: Turn = serde_json::from_str(line).map_err(|e| {
                Error::Other(format!(
                    "corrupt turns.log for room '{room_id}' at line {}: {e}",
                    i + 1
                ))
            })?;
            turns.push(turn);
        }

        if let Some(partial) = trailing_partial {
            if !partial.trim().is_empty() {
                tracing::warn!(
                    room_id = %room_id,
                    "discarding trailing partial line in turns.log"
                );
            }
        }

        Ok(turns)
    }

    fn delete_room(&self, room_id: &str) -> Result<()> {
        let dir = self.room_dir(room_id);
        if !dir.exists() {
            return Err(room_not_found(room_id));
        }
        std::fs::remove_dir_all(&dir).map_err(Error::Io)?;
        tracing::info!(room_id = %room_id, "room deleted from disk");
        Ok(())
    }

    fn list_rooms(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        if !self.root.exists() {
            return Ok(ids);
        }
        for entry in std::fs::read_dir(&self.root).map_err(Error::Io)? {
            let entry = entry.map_err(Error::Io)?;
            if entry.path().is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    ids.push(name.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}
