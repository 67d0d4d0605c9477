//! Normalized inbound event model.

use crate::payload::Payload;
use crate::store::BOOTSTRAP_KEY;
use serde::Serialize;

/// A normalized inbound message, as produced by every transport.
///
/// Exactly two kinds exist. A bootstrap carries the one-time full-state
/// blob the backend sends just after connect and has no topic of its own.
/// An update supersedes whatever was previously stored under its topic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum IngestEvent {
    /// One-time full-state snapshot, backend-proxied transport only.
    Bootstrap(Payload),
    /// Steady-state value for a single topic.
    Update {
        /// Topic the message was received on, never a subscription pattern.
        topic: String,
        /// Decoded payload.
        payload: Payload,
    },
}

impl IngestEvent {
    /// The key this event is stored and logged under.
    #[must_use]
    pub fn topic(&self) -> &str {
        match self {
            Self::Bootstrap(_) => BOOTSTRAP_KEY,
            Self::Update { topic, .. } => topic,
        }
    }

    /// The decoded payload.
    #[must_use]
    pub fn payload(&self) -> &Payload {
        match self {
            Self::Bootstrap(payload) | Self::Update { payload, .. } => payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_uses_reserved_topic() {
        let event = IngestEvent::Bootstrap(Payload::from_text("{}"));
        assert_eq!(event.topic(), BOOTSTRAP_KEY);
    }

    #[test]
    fn update_keeps_received_topic() {
        let event = IngestEvent::Update {
            topic: "home/tele/grid".to_string(),
            payload: Payload::from_text("42"),
        };
        assert_eq!(event.topic(), "home/tele/grid");
        assert_eq!(event.payload().as_json(), Some(&serde_json::json!(42)));
    }
}
