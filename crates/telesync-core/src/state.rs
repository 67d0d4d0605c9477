//! Shared adapter state: connection flag, topic store, log ring.
//!
//! One [`SharedState`] exists per transport instance and lives exactly as
//! long as it. The transport task is the only writer; consumers read by
//! taking a [`Snapshot`] copy at each poll tick, never by holding a live
//! reference into state the transport keeps mutating.

use crate::event::IngestEvent;
use crate::log::{LogEntry, LogRing};
use crate::payload::Payload;
use crate::store::TopicStore;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Immutable copy of an adapter's state at one instant.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    /// Whether the connection is currently up.
    pub connected: bool,
    /// Latest payload per topic, bootstrap key included.
    pub data: HashMap<String, Payload>,
    /// Recent raw messages, newest first.
    pub logs: Vec<LogEntry>,
}

#[derive(Debug)]
struct StateInner {
    connected: bool,
    store: TopicStore,
    ring: LogRing,
}

/// The mutable state cell a transport owns for its lifetime.
#[derive(Debug)]
pub struct SharedState {
    inner: RwLock<StateInner>,
}

impl SharedState {
    /// Create a fresh state cell with the given log capacity.
    #[must_use]
    pub fn new(log_capacity: usize) -> Self {
        Self {
            inner: RwLock::new(StateInner {
                connected: false,
                store: TopicStore::new(),
                ring: LogRing::new(log_capacity),
            }),
        }
    }

    /// Fold one event into the store and the log ring.
    ///
    /// Both effects happen under a single write acquisition, so the merge
    /// and the log append of one message are atomic with respect to every
    /// other message and every snapshot.
    pub async fn apply(&self, event: &IngestEvent) {
        let mut inner = self.inner.write().await;
        inner.store.apply(event);
        inner.ring.push(event);
    }

    /// Update the connection flag.
    pub async fn set_connected(&self, connected: bool) {
        let mut inner = self.inner.write().await;
        if inner.connected != connected {
            tracing::debug!(connected, "Connection status changed");
        }
        inner.connected = connected;
    }

    /// Current connection flag.
    pub async fn is_connected(&self) -> bool {
        self.inner.read().await.connected
    }

    /// Clone out the consumer-visible view.
    pub async fn snapshot(&self) -> Snapshot {
        let inner = self.inner.read().await;
        Snapshot {
            connected: inner.connected,
            data: inner.store.to_map(),
            logs: inner.ring.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(topic: &str, raw: &str) -> IngestEvent {
        IngestEvent::Update {
            topic: topic.to_string(),
            payload: Payload::from_text(raw),
        }
    }

    #[tokio::test]
    async fn apply_updates_store_and_ring_together() {
        let state = SharedState::new(16);
        state.apply(&update("home/tele/grid", r#"{"power":100}"#)).await;
        state.apply(&update("home/tele/grid", r#"{"power":120}"#)).await;

        let snap = state.snapshot().await;
        assert_eq!(
            snap.data.get("home/tele/grid").and_then(Payload::as_json),
            Some(&serde_json::json!({"power": 120}))
        );
        assert_eq!(snap.logs.len(), 2);
        assert_eq!(snap.logs[0].payload, r#"{"power":120}"#);
        assert_eq!(snap.logs[1].payload, r#"{"power":100}"#);
    }

    #[tokio::test]
    async fn snapshot_is_an_isolated_copy() {
        let state = SharedState::new(16);
        state.apply(&update("home/tele/grid", "1")).await;

        let snap = state.snapshot().await;
        state.apply(&update("home/tele/grid", "2")).await;
        state.set_connected(true).await;

        assert_eq!(
            snap.data.get("home/tele/grid"),
            Some(&Payload::Json(serde_json::json!(1)))
        );
        assert!(!snap.connected);
        assert_eq!(snap.logs.len(), 1);
    }

    #[tokio::test]
    async fn connected_flag_roundtrip() {
        let state = SharedState::new(4);
        assert!(!state.is_connected().await);
        state.set_connected(true).await;
        assert!(state.is_connected().await);
        state.set_connected(false).await;
        assert!(!state.snapshot().await.connected);
    }
}
