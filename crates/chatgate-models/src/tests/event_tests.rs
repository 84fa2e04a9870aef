#[cfg(test)]
mod stream_event_tests {
    use crate::events::{ErrorInfo, EventKind, StreamEvent, Usage};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn stamped(kind: EventKind) -> StreamEvent {
        StreamEvent {
            kind,
            id: "conv-1".to_string(),
            model: "gpt-4o-mini".to_string(),
            timestamp: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_text_event_wire_shape() {
        let event = stamped(EventKind::Text {
            content: "Hel".to_string(),
        });

        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "text",
                "content": "Hel",
                "id": "conv-1",
                "model": "gpt-4o-mini",
                "timestamp": 1_700_000_000_000i64
            })
        );
    }

    #[test]
    fn test_error_event_wire_shape() {
        let event = stamped(EventKind::Error {
            error: ErrorInfo {
                message: "boom".to_string(),
                code: "stream_error".to_string(),
            },
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["error"], json!({"message": "boom", "code": "stream_error"}));
        assert!(event.is_error());
        assert_eq!(event.content(), None);
    }

    #[test]
    fn test_done_event_skips_empty_fields() {
        let event = stamped(EventKind::Done {
            finish_reason: None,
            usage: None,
        });
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["type"], "done");
        assert!(value.get("finishReason").is_none());
        assert!(value.get("usage").is_none());
    }

    #[test]
    fn test_done_event_parses_back() {
        let event = stamped(EventKind::Done {
            finish_reason: Some("stop".to_string()),
            usage: Some(Usage {
                prompt_tokens: Some(3),
                completion_tokens: Some(5),
                total_tokens: Some(8),
            }),
        });
        let text = serde_json::to_string(&event).unwrap();
        assert!(text.contains("\"finishReason\":\"stop\""));
        assert!(text.contains("\"promptTokens\":3"));

        let parsed: StreamEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_new_stamps_current_time() {
        let before = chrono::Utc::now().timestamp_millis();
        let event = StreamEvent::new(
            EventKind::Thinking {
                content: "hmm".to_string(),
            },
            "unknown",
            "o3-mini",
        );

        assert!(event.timestamp >= before);
        assert_eq!(event.content(), Some("hmm"));
    }
}
