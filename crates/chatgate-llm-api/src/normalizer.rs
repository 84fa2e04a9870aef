//! Turns provider-native chunks into [`StreamEvent`]s.
//!
//! Text and thinking deltas are forwarded as they arrive. Finish reason and
//! token usage are spread over several chunks by most providers, so they
//! are accumulated and emitted as a single `done` event once the provider
//! stream ends cleanly. Any failure ends the stream with exactly one
//! `error` event.

use std::time::Duration;

use async_stream::stream;
use futures::{Stream, StreamExt};
use serde_json::Value;

use chatgate_models::{ErrorInfo, EventKind, Provider, StreamEvent, Usage, UNKNOWN_CONVERSATION_ID};

use crate::client::{ProviderStream, RawChunk};
use crate::error::StreamError;

/// Identity stamped on every event of one response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContext {
    pub id: String,
    pub model: String,
}

impl EventContext {
    pub fn new(conversation_id: Option<&str>, model: impl Into<String>) -> Self {
        Self {
            id: conversation_id.unwrap_or(UNKNOWN_CONVERSATION_ID).to_string(),
            model: model.into(),
        }
    }

    fn event(&self, kind: EventKind) -> StreamEvent {
        StreamEvent::new(kind, self.id.clone(), self.model.clone())
    }

    fn error_event(&self, error: &StreamError) -> StreamEvent {
        self.event(EventKind::Error {
            error: ErrorInfo {
                message: error.to_string(),
                code: error.code(),
            },
        })
    }
}

/// Normalize a provider stream.
///
/// `idle_timeout` bounds the wait for each chunk; `None` waits forever.
pub fn normalize(
    source: ProviderStream,
    context: EventContext,
    idle_timeout: Option<Duration>,
) -> impl Stream<Item = StreamEvent> + Send + 'static {
    stream! {
        let mut source = source;
        let mut done = DoneInfo::default();
        let mut chunk_count = 0usize;

        loop {
            let next = match idle_timeout {
                Some(limit) => match tokio::time::timeout(limit, source.next()).await {
                    Ok(next) => next,
                    Err(_) => Some(Err(StreamError::Timeout(limit))),
                },
                None => source.next().await,
            };

            let chunk = match next {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => {
                    tracing::warn!(
                        conversation_id = %context.id,
                        model = %context.model,
                        code = %e.code(),
                        "provider stream failed after {} chunks: {}",
                        chunk_count,
                        e
                    );
                    yield context.error_event(&e);
                    return;
                }
                None => break,
            };
            chunk_count += 1;

            let kinds = match map_chunk(&chunk) {
                Ok(kinds) => kinds,
                Err(e) => {
                    tracing::warn!(
                        conversation_id = %context.id,
                        provider = %chunk.provider,
                        code = %e.code(),
                        "provider reported an error: {}",
                        e
                    );
                    yield context.error_event(&e);
                    return;
                }
            };

            for kind in kinds {
                match kind {
                    EventKind::Done { finish_reason, usage } => done.merge(finish_reason, usage),
                    kind => yield context.event(kind),
                }
            }
        }

        tracing::debug!(
            conversation_id = %context.id,
            chunks = chunk_count,
            "provider stream finished"
        );

        if let Some(kind) = done.into_event() {
            yield context.event(kind);
        }
    }
}

/// Map one raw chunk to the events it carries
pub fn map_chunk(chunk: &RawChunk) -> Result<Vec<EventKind>, StreamError> {
    match chunk.provider {
        Provider::OpenAi => map_openai_chunk(&chunk.payload),
        Provider::Anthropic => map_anthropic_chunk(&chunk.payload),
        Provider::Gemini => map_gemini_chunk(&chunk.payload),
    }
}

/// Finish reason and usage collected across chunks
#[derive(Debug, Default)]
struct DoneInfo {
    finish_reason: Option<String>,
    usage: Option<Usage>,
}

impl DoneInfo {
    fn merge(&mut self, finish_reason: Option<String>, usage: Option<Usage>) {
        if finish_reason.is_some() {
            self.finish_reason = finish_reason;
        }
        if let Some(update) = usage {
            let current = self.usage.get_or_insert_with(Usage::default);
            current.prompt_tokens = update.prompt_tokens.or(current.prompt_tokens);
            current.completion_tokens = update.completion_tokens.or(current.completion_tokens);
            current.total_tokens = update.total_tokens.or(current.total_tokens);
        }
    }

    fn into_event(self) -> Option<EventKind> {
        if self.finish_reason.is_none() && self.usage.is_none() {
            return None;
        }

        let usage = self.usage.map(|mut usage| {
            if usage.total_tokens.is_none() {
                if let (Some(prompt), Some(completion)) = (usage.prompt_tokens, usage.completion_tokens) {
                    usage.total_tokens = Some(prompt.saturating_add(completion));
                }
            }
            usage
        });

        Some(EventKind::Done {
            finish_reason: self.finish_reason,
            usage,
        })
    }
}

fn non_empty_str<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn token_count(value: &Value, pointer: &str) -> Option<u32> {
    value
        .pointer(pointer)
        .and_then(Value::as_u64)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
}

/// Error code as a string, whether the provider sends a string or a number
fn code_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn upstream_error(error: &Value, code_keys: &[&str]) -> StreamError {
    let message = match error {
        Value::String(s) => s.clone(),
        _ => error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
    };
    let code = code_keys
        .iter()
        .find_map(|key| code_string(error.get(*key)));

    StreamError::Upstream { message, code }
}

fn map_openai_chunk(payload: &Value) -> Result<Vec<EventKind>, StreamError> {
    if let Some(error) = payload.get("error").filter(|e| !e.is_null()) {
        return Err(upstream_error(error, &["code", "type"]));
    }

    let mut events = Vec::new();

    let reasoning = non_empty_str(payload, "/choices/0/delta/reasoning_content")
        .or_else(|| non_empty_str(payload, "/choices/0/delta/reasoning"));
    if let Some(content) = reasoning {
        events.push(EventKind::Thinking {
            content: content.to_string(),
        });
    }

    if let Some(content) = non_empty_str(payload, "/choices/0/delta/content") {
        events.push(EventKind::Text {
            content: content.to_string(),
        });
    }

    let finish_reason = non_empty_str(payload, "/choices/0/finish_reason").map(str::to_string);
    let usage = payload
        .get("usage")
        .filter(|u| u.is_object())
        .map(|usage| Usage {
            prompt_tokens: token_count(usage, "/prompt_tokens"),
            completion_tokens: token_count(usage, "/completion_tokens"),
            total_tokens: token_count(usage, "/total_tokens"),
        });
    if finish_reason.is_some() || usage.is_some() {
        events.push(EventKind::Done {
            finish_reason,
            usage,
        });
    }

    Ok(events)
}

fn map_anthropic_chunk(payload: &Value) -> Result<Vec<EventKind>, StreamError> {
    let event_type = payload.get("type").and_then(Value::as_str).unwrap_or_default();

    let event = match event_type {
        "error" => {
            let error = payload.get("error").unwrap_or(payload);
            return Err(upstream_error(error, &["type"]));
        }
        "content_block_delta" => {
            match payload.pointer("/delta/type").and_then(Value::as_str) {
                Some("text_delta") => non_empty_str(payload, "/delta/text").map(|text| {
                    EventKind::Text {
                        content: text.to_string(),
                    }
                }),
                Some("thinking_delta") => non_empty_str(payload, "/delta/thinking").map(|text| {
                    EventKind::Thinking {
                        content: text.to_string(),
                    }
                }),
                // input_json_delta, signature_delta
                _ => None,
            }
        }
        "message_start" => token_count(payload, "/message/usage/input_tokens").map(|input| {
            EventKind::Done {
                finish_reason: None,
                usage: Some(Usage {
                    prompt_tokens: Some(input),
                    ..Usage::default()
                }),
            }
        }),
        "message_delta" => {
            let finish_reason = non_empty_str(payload, "/delta/stop_reason").map(str::to_string);
            let usage = token_count(payload, "/usage/output_tokens").map(|output| Usage {
                completion_tokens: Some(output),
                ..Usage::default()
            });
            (finish_reason.is_some() || usage.is_some()).then_some(EventKind::Done {
                finish_reason,
                usage,
            })
        }
        // ping, content_block_start, content_block_stop, message_stop
        _ => None,
    };

    Ok(event.into_iter().collect())
}

fn map_gemini_chunk(payload: &Value) -> Result<Vec<EventKind>, StreamError> {
    if let Some(error) = payload.get("error").filter(|e| !e.is_null()) {
        return Err(upstream_error(error, &["status", "code"]));
    }

    let mut events = Vec::new();

    if let Some(parts) = payload
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
    {
        for part in parts {
            let Some(text) = part.get("text").and_then(Value::as_str).filter(|t| !t.is_empty()) else {
                continue;
            };
            let content = text.to_string();
            if part.get("thought").and_then(Value::as_bool).unwrap_or(false) {
                events.push(EventKind::Thinking { content });
            } else {
                events.push(EventKind::Text { content });
            }
        }
    }

    let finish_reason = non_empty_str(payload, "/candidates/0/finishReason").map(str::to_string);
    let usage = payload.get("usageMetadata").map(|meta| Usage {
        prompt_tokens: token_count(meta, "/promptTokenCount"),
        completion_tokens: token_count(meta, "/candidatesTokenCount"),
        total_tokens: token_count(meta, "/totalTokenCount"),
    });
    if finish_reason.is_some() || usage.is_some() {
        events.push(EventKind::Done {
            finish_reason,
            usage,
        });
    }

    Ok(events)
}
