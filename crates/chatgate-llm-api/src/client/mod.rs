use async_trait::async_trait;
use futures::stream::BoxStream;
use reqwest::header::HeaderMap;
use serde_json::Value;

use chatgate_models::{Message, Provider, Role};

use crate::config::Credential;
use crate::error::{AdapterError, StreamError};

#[cfg(feature = "anthropic")]
pub mod anthropic;
#[cfg(feature = "gemini")]
pub mod gemini;
#[cfg(feature = "openai")]
pub mod openai;
pub mod sse;

/// One provider-native stream payload, not yet normalized
#[derive(Debug, Clone, PartialEq)]
pub struct RawChunk {
    pub provider: Provider,
    pub payload: Value,
}

impl RawChunk {
    pub fn new(provider: Provider, payload: Value) -> Self {
        Self { provider, payload }
    }
}

/// Lazy, pull-based sequence of raw chunks from one provider connection.
///
/// Dropping the stream closes the upstream connection.
pub type ProviderStream = BoxStream<'static, Result<RawChunk, StreamError>>;

/// Provider client trait - one implementation per vendor API
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn provider(&self) -> Provider;

    /// Send the chat request and return the provider's event stream.
    ///
    /// Fails before returning if the connection cannot be opened or the
    /// provider answers with a non-success status.
    async fn open_stream(&self, messages: &[Message]) -> Result<ProviderStream, AdapterError>;
}

/// POST a streaming request and turn the response into raw chunks
pub(crate) async fn send_streaming_request(
    http: &reqwest::Client,
    provider: Provider,
    url: &str,
    headers: HeaderMap,
    body: &Value,
    credential: &Credential,
) -> Result<ProviderStream, AdapterError> {
    chatgate_logging::log_upstream_request(provider.as_str(), url, body, credential.expose());

    let response = http
        .post(url)
        .headers(headers)
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .json(body)
        .send()
        .await
        .map_err(|e| AdapterError::open(provider, e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        chatgate_logging::log_upstream_response(provider.as_str(), status, Some(&error_text));
        return Err(AdapterError::open(
            provider,
            format!("{} - {}", status, upstream_error_message(&error_text)),
        ));
    }
    chatgate_logging::log_upstream_response(provider.as_str(), status, None);

    Ok(sse::raw_chunks(provider, response.bytes_stream()))
}

/// Pull `error.message` out of a JSON error body, falling back to the raw text
fn upstream_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            json.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Join the text of all system messages, if any
pub(crate) fn combined_system_prompt(messages: &[Message]) -> Option<String> {
    let system_messages: Vec<String> = messages
        .iter()
        .filter(|msg| msg.role == Role::System)
        .map(Message::text)
        .collect();

    if system_messages.is_empty() {
        None
    } else {
        Some(system_messages.join("\n\n"))
    }
}

/// Conversation turns for APIs that only know user and assistant roles
pub(crate) fn conversation_turns(messages: &[Message]) -> impl Iterator<Item = (Role, String)> + '_ {
    messages
        .iter()
        .filter(|msg| msg.role != Role::System)
        .map(|msg| {
            let role = match msg.role {
                Role::Assistant => Role::Assistant,
                _ => Role::User,
            };
            (role, msg.text())
        })
}
