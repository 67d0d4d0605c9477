//! # Backend WebSocket Adapter
//!
//! Ingestion from the backend-proxied WebSocket feed at `ws://<host>/ws`.
//!
//! The backend keeps its own broker subscription and forwards everything it
//! sees, so this transport has a single implicit subscription and issues no
//! outbound frames. It classifies each inbound frame as a bootstrap
//! snapshot or a topic update, folds it into the adapter-owned state, and
//! reconnects forever on a fixed delay.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod transport;

pub use transport::{WsTransport, WsTransportConfig, WsTransportError};
