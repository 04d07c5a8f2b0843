//! Per-room cancellation tokens.
//!
//! Each running `ContinuousController` gets a `CancelToken`. Calling
//! `cancel()` signals the tick loop to stop starting new `Think` calls; a
//! reply already in flight when cancellation fires is still appended once it
//! lands (see `controller::run_agent_turn`).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// A cancellation token that can be checked by the tick loop.
#[derive(Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks active cancellation tokens per room id.
pub struct CancelMap {
    tokens: Mutex<HashMap<String, CancelToken>>,
}

impl Default for CancelMap {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelMap {
    pub fn new() -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Create and register a new cancel token for a room.
    pub fn register(&self, room_id: &str) -> CancelToken {
        let token = CancelToken::new();
        self.tokens.lock().insert(room_id.to_owned(), token.clone());
        token
    }

    /// Cancel a running room's Controller. Returns true if a token was found.
    pub fn cancel(&self, room_id: &str) -> bool {
        if let Some(token) = self.tokens.lock().get(room_id) {
            token.cancel();
            true
        } else {
            false
        }
    }

    /// Remove the token for a room (called when its Controller stops).
    pub fn remove(&self, room_id: &str) {
        self.tokens.lock().remove(room_id);
    }

    /// Check if a room has an active Controller registered.
    pub fn is_running(&self, room_id: &str) -> bool {
        self.tokens.lock().contains_key(room_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_lifecycle() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn cancel_map_register_and_cancel() {
        let map = CancelMap::new();
        let token = map.register("room-1");
        assert!(!token.is_cancelled());
        assert!(map.is_running("room-1"));

        assert!(map.cancel("room-1"));
        assert!(token.is_cancelled());

        map.remove("room-1");
        assert!(!map.is_running("room-1"));
        assert!(!map.cancel("room-1"));
    }

    #[test]
    fn cancel_nonexistent_room_returns_false() {
        let map = CancelMap::new();
        assert!(!map.cancel("does-not-exist"));
    }

    #[test]
    fn register_replaces_previous_token() {
        let map = CancelMap::new();
        let old_token = map.register("room-1");
        let new_token = map.register("room-1");

        assert!(!old_token.is_cancelled());
        assert!(!new_token.is_cancelled());

        map.cancel("room-1");
        assert!(new_token.is_cancelled());
    }

    #[test]
    fn cancel_token_clone_shares_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn remove_is_idempotent() {
        let map = CancelMap::new();
        map.register("room-1");
        map.remove("room-1");
        map.remove("room-1");
        assert!(!map.is_running("room-1"));
    }
}
