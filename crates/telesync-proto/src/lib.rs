//! # Telesync Protocol
//!
//! Wire frame definitions for the backend-proxied WebSocket feed.
//!
//! ## Frames
//!
//! The backend forwards exactly two frame shapes over `ws://<host>/ws`:
//! - `{"bootstrap": <any>}` — one-time full-state snapshot, sent just
//!   after connect
//! - `{"topic": string, "payload": any}` — steady-state topic update
//!
//! This subsystem defines no outbound frames. The broker-direct transport
//! bypasses this crate entirely; its publishes already arrive as
//! `(topic, payload)` pairs.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod frame;

pub use frame::{parse_frame, FrameError};
