//! # Telesync Core
//!
//! Event model, merge semantics, and shared adapter state for telesync.
//!
//! This crate provides:
//! - Payload decoding with structured-or-raw fallback
//! - The normalized inbound event model shared by all transports
//! - Topic-keyed last-write-wins state store with a reserved bootstrap slot
//! - Bounded, newest-first diagnostic log ring
//! - MQTT-style topic filters (`+` and `#` wildcards)
//! - The shared state cell a transport mutates and consumers snapshot

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod event;
pub mod log;
pub mod payload;
pub mod state;
pub mod store;
pub mod topic;

pub use event::IngestEvent;
pub use log::{LogEntry, LogRing};
pub use payload::Payload;
pub use state::{SharedState, Snapshot};
pub use store::{TopicStore, BOOTSTRAP_KEY};
pub use topic::{FilterError, TopicFilter};
