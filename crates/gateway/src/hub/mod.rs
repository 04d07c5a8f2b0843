//! Bridges `ContinuousController` events to WebSocket clients.
//!
//! Grounded on the teacher's `nodes/ws.rs` hub: a registry of per-connection
//! bounded senders, best-effort broadcast against a publish deadline, and
//! silent eviction of any subscriber that can't keep up.

pub mod protocol;
pub mod ws;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;

pub use protocol::{ClientInbound, ClientOutbound};

const SUBSCRIBER_CHANNEL_CAPACITY: usize = 64;

pub struct ClientHub {
    next_id: AtomicU64,
    subscribers: Mutex<HashMap<u64, mpsc::Sender<ClientOutbound>>>,
}

impl Default for ClientHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientHub {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    /// Register a new connection. Returns its id and the receiving end of
    /// its outbound channel.
    pub fn subscribe(&self) -> (u64, mpsc::Receiver<ClientOutbound>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CHANNEL_CAPACITY);
        self.subscribers.lock().insert(id, tx);
        (id, rx)
    }

    pub fn unsubscribe(&self, id: u64) {
        self.subscribers.lock().remove(&id);
    }

    /// Deliver a message to exactly one connection, e.g. a reply to a
    /// request-shaped inbound command. Returns `false` if the connection is
    /// gone or its channel is closed.
    pub async fn send_to(&self, id: u64, msg: ClientOutbound) -> bool {
        let tx = self.subscribers.lock().get(&id).cloned();
        match tx {
            Some(tx) => tx.send(msg).await.is_ok(),
            None => false,
        }
    }

    /// Best-effort broadcast to every connected client. A subscriber whose
    /// channel is still full after `publish_timeout` is dropped; it must
    /// `subscribe` again to keep receiving events.
    pub async fn publish(&self, msg: ClientOutbound, publish_timeout: Duration) {
        let senders: Vec<(u64, mpsc::Sender<ClientOutbound>)> = self
            .subscribers
            .lock()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let mut dead = Vec::new();
        for (id, tx) in senders {
            match tokio::time::timeout(publish_timeout, tx.send(msg.clone())).await {
                Ok(Ok(())) => {}
                _ => dead.push(id),
            }
        }

        if !dead.is_empty() {
            let mut subs = self.subscribers.lock();
            for id in dead {
                subs.remove(&id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deleted(room_id: &str) -> ClientOutbound {
        ClientOutbound::RoomDeleted {
            room_id: room_id.to_string(),
        }
    }

    #[tokio::test]
    async fn publish_reaches_all_subscribers() {
        let hub = ClientHub::new();
        let (_id1, mut rx1) = hub.subscribe();
        let (_id2, mut rx2) = hub.subscribe();
        hub.publish(deleted("r1"), Duration::from_millis(50)).await;
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn send_to_unknown_id_returns_false() {
        let hub = ClientHub::new();
        assert!(!hub.send_to(999, deleted("r1")).await);
    }

    #[tokio::test]
    async fn full_channel_is_evicted_after_publish_timeout() {
        let hub = ClientHub::new();
        let (id, _rx) = hub.subscribe(); // never drained, so its buffer fills up
        for _ in 0..SUBSCRIBER_CHANNEL_CAPACITY + 1 {
            hub.publish(deleted("r"), Duration::from_millis(20)).await;
        }
        assert!(!hub.send_to(id, deleted("r")).await);
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let hub = ClientHub::new();
        let (id, _rx) = hub.subscribe();
        hub.unsubscribe(id);
        assert!(!hub.send_to(id, deleted("r")).await);
    }
}
