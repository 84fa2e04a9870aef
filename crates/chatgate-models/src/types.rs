use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// One part of a multi-part message body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentPart {
    Text {
        #[serde(alias = "text")]
        content: String,
    },
    /// Images, files and other part types the gateway passes over
    #[serde(other)]
    Other,
}

/// Message body: either a bare string or an ordered list of parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

/// Message structure for the chat API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: MessageContent,
}

impl Message {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Concatenated text of the message; non-text parts are skipped
    pub fn text(&self) -> String {
        match &self.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { content } => Some(content.as_str()),
                    ContentPart::Other => None,
                })
                .collect(),
        }
    }
}

/// Problems with the shape of an inbound chat request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid JSON body: {0}")]
    InvalidJson(String),
    #[error("messages array is required")]
    MissingMessages,
    #[error("messages array must not be empty")]
    EmptyMessages,
    #[error("invalid message at index {index}: {reason}")]
    InvalidMessage { index: usize, reason: String },
    #[error("{field} must be a string")]
    InvalidField { field: &'static str },
}

/// Validated chat request
///
/// Wire shape: `{ messages, data?: { model? }, model?, conversationId? }`.
/// The top-level `model` wins over `data.model` when both are present.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub model: Option<String>,
    pub conversation_id: Option<String>,
}

impl ChatRequest {
    /// Parse and validate a raw request body
    pub fn from_slice(body: &[u8]) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| ValidationError::InvalidJson(e.to_string()))?;
        Self::from_value(value)
    }

    /// Validate an already-parsed request body
    pub fn from_value(body: Value) -> Result<Self, ValidationError> {
        let Value::Object(mut body) = body else {
            return Err(ValidationError::MissingMessages);
        };

        let items = match body.remove("messages") {
            Some(Value::Array(items)) => items,
            _ => return Err(ValidationError::MissingMessages),
        };
        if items.is_empty() {
            return Err(ValidationError::EmptyMessages);
        }

        let messages = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value::<Message>(item).map_err(|e| {
                    ValidationError::InvalidMessage {
                        index,
                        reason: e.to_string(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let top_level_model = optional_string(body.get("model"), "model")?;
        let data_model = match body.get("data") {
            Some(Value::Object(data)) => optional_string(data.get("model"), "data.model")?,
            _ => None,
        };
        let conversation_id = optional_string(body.get("conversationId"), "conversationId")?;

        Ok(Self {
            messages,
            model: top_level_model.or(data_model),
            conversation_id,
        })
    }
}

fn optional_string(
    value: Option<&Value>,
    field: &'static str,
) -> Result<Option<String>, ValidationError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ValidationError::InvalidField { field }),
    }
}
