//! Bounded, newest-first diagnostic log of raw messages.

use crate::event::IngestEvent;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

/// One received message, stamped at local receipt time.
///
/// Log entries are diagnostic only; the [`TopicStore`](crate::TopicStore)
/// is the authoritative state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    /// Monotonically increasing id within one ring.
    pub id: u64,
    /// Local receipt timestamp, not a broker timestamp.
    pub timestamp: DateTime<Utc>,
    /// Topic the message arrived on, `bootstrap` for bootstrap frames.
    pub topic: String,
    /// Serialized raw payload.
    pub payload: String,
}

/// Ring of the most recently received messages, newest first.
///
/// Oldest entries are evicted once the configured capacity is exceeded.
#[derive(Debug, Clone)]
pub struct LogRing {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    next_id: u64,
}

impl LogRing {
    /// Default capacity, matching the dashboard log panel depth.
    pub const DEFAULT_CAPACITY: usize = 1000;

    /// Create a ring holding at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            next_id: 0,
        }
    }

    /// Record a received event at the front of the ring.
    pub fn push(&mut self, event: &IngestEvent) {
        let entry = LogEntry {
            id: self.next_id,
            timestamp: Utc::now(),
            topic: event.topic().to_string(),
            payload: event.payload().to_wire_string(),
        };
        self.next_id += 1;

        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Iterate newest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Clone the entries out, newest first, for a consumer snapshot.
    #[must_use]
    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no message has been logged yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for LogRing {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
