//! Topic-keyed last-write-wins state store.

use crate::event::IngestEvent;
use crate::payload::Payload;
use std::collections::HashMap;

/// Reserved key the bootstrap blob is stored under.
///
/// A `/`-less key cannot collide with real hierarchical topics.
pub const BOOTSTRAP_KEY: &str = "bootstrap";

/// Latest-known-value cache keyed by topic.
///
/// The key set grows as messages arrive and never shrinks for the lifetime
/// of one adapter instance. A newer message for a topic unconditionally
/// replaces the older stored value; there is no versioning or conflict
/// detection. The bootstrap blob lives under [`BOOTSTRAP_KEY`] and is
/// replaced wholesale, leaving every topic entry untouched.
#[derive(Debug, Clone, Default)]
pub struct TopicStore {
    entries: HashMap<String, Payload>,
}

impl TopicStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one normalized event into the store.
    pub fn apply(&mut self, event: &IngestEvent) {
        match event {
            IngestEvent::Bootstrap(payload) => {
                self.entries
                    .insert(BOOTSTRAP_KEY.to_string(), payload.clone());
            }
            IngestEvent::Update { topic, payload } => {
                self.entries.insert(topic.clone(), payload.clone());
            }
        }
    }

    /// Latest payload stored under a topic.
    #[must_use]
    pub fn get(&self, topic: &str) -> Option<&Payload> {
        self.entries.get(topic)
    }

    /// The bootstrap blob, if one arrived on this connection's lifetime.
    #[must_use]
    pub fn bootstrap(&self) -> Option<&Payload> {
        self.entries.get(BOOTSTRAP_KEY)
    }

    /// Iterate over all entries, bootstrap included.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Payload)> {
        self.entries.iter()
    }

    /// Clone the mapping out for a consumer-visible snapshot.
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, Payload> {
        self.entries.clone()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been stored yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
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

    #[test]
    fn last_write_wins_per_topic() {
        let mut store = TopicStore::new();
        store.apply(&update("home/tele/grid", r#"{"power":100}"#));
        store.apply(&update("home/tele/temps", r#"{"out":7.5}"#));
        store.apply(&update("home/tele/grid", r#"{"power":120}"#));

        assert_eq!(
            store.get("home/tele/grid").and_then(Payload::as_json),
            Some(&serde_json::json!({"power": 120}))
        );
        assert_eq!(
            store.get("home/tele/temps").and_then(Payload::as_json),
            Some(&serde_json::json!({"out": 7.5}))
        );
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn bootstrap_replaces_only_reserved_key() {
        let mut store = TopicStore::new();
        store.apply(&update("home/status/pump", "ON"));
        store.apply(&IngestEvent::Bootstrap(Payload::from_text(
            r#"{"rooms":["living","attic"]}"#,
        )));

        assert_eq!(
            store.bootstrap().and_then(Payload::as_json),
            Some(&serde_json::json!({"rooms": ["living", "attic"]}))
        );
        assert_eq!(
            store.get("home/status/pump"),
            Some(&Payload::Text("ON".to_string()))
        );

        // A later bootstrap is a full replacement, not a merge.
        store.apply(&IngestEvent::Bootstrap(Payload::from_text(r#"{"rooms":[]}"#)));
        assert_eq!(
            store.bootstrap().and_then(Payload::as_json),
            Some(&serde_json::json!({"rooms": []}))
        );
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn update_after_bootstrap_is_added_alongside() {
        let mut store = TopicStore::new();
        store.apply(&IngestEvent::Bootstrap(Payload::from_text(
            r#"{"rooms":[1,2]}"#,
        )));
        store.apply(&update("home/tele/grid", r#"{"power":80}"#));

        assert!(store.bootstrap().is_some());
        assert!(store.get("home/tele/grid").is_some());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn key_set_never_shrinks() {
        let mut store = TopicStore::new();
        for i in 0..50 {
            store.apply(&update(&format!("home/tele/room/{i}/temp"), "21"));
        }
        let before = store.len();
        for i in 0..50 {
            store.apply(&update(&format!("home/tele/room/{i}/temp"), "22"));
        }
        assert_eq!(store.len(), before);
    }
}
