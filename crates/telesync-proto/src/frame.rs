//! Backend frame classification.

use telesync_core::{IngestEvent, Payload};

/// Classify one backend text frame into the normalized event model.
///
/// A frame carrying a `bootstrap` field is the one-time full-state
/// snapshot; everything else must carry a `topic` and becomes a topic
/// update. An update's missing `payload` field normalizes to JSON `null`.
///
/// # Errors
///
/// Returns error if the frame is not a JSON object, or carries neither a
/// `bootstrap` nor a `topic` field. Callers log and skip such frames; a
/// malformed frame never aborts the connection.
pub fn parse_frame(text: &str) -> Result<IngestEvent, FrameError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| FrameError::Json(e.to_string()))?;

    let Some(object) = value.as_object() else {
        return Err(FrameError::UnknownShape(preview(text)));
    };

    if let Some(bootstrap) = object.get("bootstrap") {
        return Ok(IngestEvent::Bootstrap(Payload::from_value(bootstrap.clone())));
    }

    match object.get("topic") {
        Some(serde_json::Value::String(topic)) => {
            let payload = object
                .get("payload")
                .cloned()
                .unwrap_or(serde_json::Value::Null);
            Ok(IngestEvent::Update {
                topic: topic.clone(),
                payload: Payload::from_value(payload),
            })
        }
        Some(other) => Err(FrameError::BadTopic(other.to_string())),
        None => Err(FrameError::UnknownShape(preview(text))),
    }
}

/// Truncate frame text for error messages.
fn preview(text: &str) -> String {
    const MAX: usize = 120;
    if text.len() <= MAX {
        text.to_string()
    } else {
        let cut = text
            .char_indices()
            .take_while(|(i, _)| *i < MAX)
            .last()
            .map_or(0, |(i, c)| i + c.len_utf8());
        format!("{}…", &text[..cut])
    }
}

/// Errors that can occur classifying a backend frame.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FrameError {
    /// Frame is not valid JSON
    #[error("frame is not valid JSON: {0}")]
    Json(String),
    /// Frame carries neither `bootstrap` nor `topic`
    #[error("frame has neither 'bootstrap' nor 'topic': {0}")]
    UnknownShape(String),
    /// Frame `topic` field is not a string
    #[error("frame 'topic' is not a string: {0}")]
    BadTopic(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use telesync_core::BOOTSTRAP_KEY;

    #[test]
    fn bootstrap_frame() {
        let event = parse_frame(r#"{"bootstrap": {"rooms": ["living"]}}"#).unwrap();

        assert_eq!(event.topic(), BOOTSTRAP_KEY);
        assert_eq!(
            event.payload().as_json(),
            Some(&serde_json::json!({"rooms": ["living"]}))
        );
    }

    #[test]
    fn update_frame() {
        let event = parse_frame(r#"{"topic": "home/tele/grid", "payload": {"power": 100}}"#)
            .unwrap();

        assert_eq!(event.topic(), "home/tele/grid");
        assert_eq!(
            event.payload().as_json(),
            Some(&serde_json::json!({"power": 100}))
        );
    }

    #[test]
    fn string_payload_is_redecoded() {
        let event =
            parse_frame(r#"{"topic": "home/tele/grid", "payload": "{\"power\":120}"}"#).unwrap();

        assert_eq!(
            event.payload().as_json(),
            Some(&serde_json::json!({"power": 120}))
        );
    }

    #[test]
    fn opaque_string_payload_stays_text() {
        let event = parse_frame(r#"{"topic": "home/status/pump", "payload": "ON"}"#).unwrap();
        assert_eq!(event.payload(), &Payload::Text("ON".to_string()));
    }

    #[test]
    fn missing_payload_becomes_null() {
        let event = parse_frame(r#"{"topic": "home/cmd/pump/rad"}"#).unwrap();
        assert_eq!(event.payload().as_json(), Some(&serde_json::Value::Null));
    }

    #[test]
    fn bootstrap_wins_over_topic() {
        // A frame carrying both fields is a bootstrap; the backend tags it.
        let event = parse_frame(r#"{"bootstrap": {}, "topic": "t"}"#).unwrap();
        assert_eq!(event.topic(), BOOTSTRAP_KEY);
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(parse_frame("not json"), Err(FrameError::Json(_))));
    }

    #[test]
    fn non_object_frame_is_unknown() {
        assert!(matches!(
            parse_frame("[1, 2]"),
            Err(FrameError::UnknownShape(_))
        ));
    }

    #[test]
    fn frame_without_topic_is_unknown() {
        assert!(matches!(
            parse_frame(r#"{"payload": 1}"#),
            Err(FrameError::UnknownShape(_))
        ));
    }

    #[test]
    fn non_string_topic_is_rejected() {
        assert!(matches!(
            parse_frame(r#"{"topic": 5, "payload": 1}"#),
            Err(FrameError::BadTopic(_))
        ));
    }
}
