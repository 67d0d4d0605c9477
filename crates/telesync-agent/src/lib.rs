//! # Telesync Agent
//!
//! Ingestion runtime tying the pieces together.
//!
//! ## Architecture
//!
//! One session owns exactly one transport:
//! 1. **Transport**: the configured adapter (backend WebSocket or direct
//!    broker) receives, normalizes, and folds messages into its own state
//! 2. **Bridge**: samples that state on a fixed interval into a
//!    change-notified snapshot channel for consumers
//! 3. **Runtime**: wires config, logging, and shutdown around a session

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bridge;
pub mod config;
pub mod runtime;

pub use bridge::{BridgeError, IngestBridge};
pub use config::{BackendConfig, BrokerConfig, IngestConfig, TransportMode};
pub use runtime::Agent;
