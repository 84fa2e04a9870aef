//! Normalized stream events sent to chat clients.
//!
//! Every event carries the conversation id, the provider model id and a
//! millisecond timestamp next to its `type`-tagged payload:
//!
//! ```json
//! {"type":"text","content":"Hel","id":"conv-1","model":"gpt-4o-mini","timestamp":1700000000000}
//! {"type":"error","error":{"message":"overloaded","code":"overloaded_error"},"id":"conv-1","model":"gpt-4o-mini","timestamp":1700000000001}
//! ```

use serde::{Deserialize, Serialize};

/// Conversation id used when the client did not send one
pub const UNKNOWN_CONVERSATION_ID: &str = "unknown";

/// Token accounting reported by a provider at the end of a stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u32>,
}

/// Error payload of a terminal error event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventKind {
    Text {
        content: String,
    },
    Thinking {
        content: String,
    },
    Done {
        #[serde(
            rename = "finishReason",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        finish_reason: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage: Option<Usage>,
    },
    Error {
        error: ErrorInfo,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
    #[serde(flatten)]
    pub kind: EventKind,
    pub id: String,
    pub model: String,
    pub timestamp: i64,
}

impl StreamEvent {
    /// Stamp an event with the current time
    pub fn new(kind: EventKind, id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            model: model.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, EventKind::Error { .. })
    }

    /// Text carried by a text or thinking event
    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Text { content } | EventKind::Thinking { content } => Some(content),
            _ => None,
        }
    }
}
