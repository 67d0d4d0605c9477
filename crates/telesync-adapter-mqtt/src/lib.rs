//! # Broker MQTT Adapter
//!
//! Direct ingestion from the home MQTT broker, usually over its WebSocket
//! listener (`ws://<broker>:9001`).
//!
//! Unlike the backend-proxied feed, this transport subscribes explicitly
//! to a configured list of topic patterns (single-segment `+` and trailing
//! `#` wildcards allowed) and reissues every subscription on each
//! reconnect. It never produces bootstrap events; every publish becomes a
//! topic update keyed by the received topic.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod transport;

pub use transport::{MqttTransport, MqttTransportConfig, MqttTransportError};
