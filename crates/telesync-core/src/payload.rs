//! Payload decoding with structured-or-raw fallback.

use serde::Serialize;

/// A decoded message payload.
///
/// Devices on the home bus publish JSON when they cooperate and opaque
/// strings otherwise. Decoding never fails and never drops a message:
/// anything that does not parse as JSON is kept verbatim as text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// Payload parsed as structured JSON.
    Json(serde_json::Value),
    /// Raw string kept verbatim because it is not valid JSON.
    Text(String),
}

impl Payload {
    /// Decode raw payload bytes.
    ///
    /// Invalid UTF-8 is recovered lossily before the JSON attempt, so a
    /// mangled frame still produces a loggable value.
    #[must_use]
    pub fn from_bytes(raw: &[u8]) -> Self {
        Self::from_text(&String::from_utf8_lossy(raw))
    }

    /// Decode a raw payload string, falling back to the verbatim text.
    #[must_use]
    pub fn from_text(raw: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(raw.to_string()),
        }
    }

    /// Decode a JSON value that arrived embedded in a larger frame.
    ///
    /// String values get a second decode attempt: backends that forward
    /// device payloads verbatim wrap JSON documents in JSON strings.
    #[must_use]
    pub fn from_value(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(text) => Self::from_text(&text),
            other => Self::Json(other),
        }
    }

    /// The structured form, if this payload decoded as JSON.
    #[must_use]
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// Serialized wire form, as stored in log entries.
    #[must_use]
    pub fn to_wire_string(&self) -> String {
        match self {
            Self::Json(value) => value.to_string(),
            Self::Text(text) => text.clone(),
        }
    }
}

impl std::fmt::Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(value) => write!(f, "{value}"),
            Self::Text(text) => write!(f, "{text}"),
        }
    }
}
