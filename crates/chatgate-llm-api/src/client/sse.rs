//! Server-sent-event decoding for provider responses.
//!
//! Providers stream `data: {json}` lines separated by blank lines. OpenAI
//! finishes with a literal `data: [DONE]` and Anthropic with a
//! `message_stop` event; Gemini simply closes the connection. A stream
//! that closes without its provider's end marker was cut off.

use std::fmt::Display;

use async_stream::stream;
use futures::{Stream, StreamExt};
use serde_json::Value;

use chatgate_models::Provider;

use super::{ProviderStream, RawChunk};
use crate::error::StreamError;

/// Payload that marks the end of an OpenAI-style stream
pub const DONE_MARKER: &str = "[DONE]";

/// Anthropic event type that ends a complete message
pub const ANTHROPIC_STOP_EVENT: &str = "message_stop";

/// Incremental SSE parser yielding the `data` payload of each event
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes; returns the payloads of every event completed by them
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Result<String, StreamError>> {
        self.buffer.extend(bytes.iter().copied().filter(|b| *b != b'\r'));

        let mut payloads = Vec::new();
        while let Some(end) = find_event_end(&self.buffer) {
            let event: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(payload) = parse_event(&event[..end]) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flush a trailing event that was not followed by a blank line
    pub fn finish(&mut self) -> Option<Result<String, StreamError>> {
        let rest = std::mem::take(&mut self.buffer);
        if rest.iter().all(u8::is_ascii_whitespace) {
            return None;
        }
        parse_event(&rest)
    }
}

fn find_event_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

fn parse_event(event: &[u8]) -> Option<Result<String, StreamError>> {
    let text = match std::str::from_utf8(event) {
        Ok(text) => text,
        Err(e) => return Some(Err(StreamError::Malformed(e.to_string()))),
    };

    let mut data_lines = Vec::new();
    for line in text.lines() {
        if let Some(data) = line.strip_prefix("data:") {
            data_lines.push(data.strip_prefix(' ').unwrap_or(data));
        }
        // `event:`, `id:`, `retry:` and `:` comment lines carry nothing we use
    }

    if data_lines.is_empty() {
        None
    } else {
        Some(Ok(data_lines.join("\n")))
    }
}

/// Decode a byte stream into SSE data payloads
pub fn data_payloads<S, B, E>(bytes: S) -> impl Stream<Item = Result<String, StreamError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    stream! {
        let mut decoder = SseDecoder::new();
        let mut bytes = Box::pin(bytes);

        while let Some(chunk_result) = bytes.next().await {
            match chunk_result {
                Ok(chunk) => {
                    for payload in decoder.push(chunk.as_ref()) {
                        yield payload;
                    }
                }
                Err(e) => {
                    yield Err(StreamError::Transport(e.to_string()));
                    return;
                }
            }
        }

        if let Some(payload) = decoder.finish() {
            yield payload;
        }
    }
}

/// The in-band marker `provider` sends at the end of a complete response
fn end_marker(provider: Provider) -> Option<&'static str> {
    match provider {
        Provider::OpenAi => Some(DONE_MARKER),
        Provider::Anthropic => Some(ANTHROPIC_STOP_EVENT),
        Provider::Gemini => None,
    }
}

/// Decode a provider byte stream into JSON chunks.
///
/// Stops at [`DONE_MARKER`]; a payload that is not JSON is an error, and so
/// is a connection that closes before the provider's end marker.
pub fn raw_chunks<S, B, E>(provider: Provider, bytes: S) -> ProviderStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let payloads = data_payloads(bytes);

    Box::pin(stream! {
        let mut payloads = Box::pin(payloads);
        let mut chunk_counter = 0usize;
        let mut completed = end_marker(provider).is_none();

        while let Some(payload) = payloads.next().await {
            let data = match payload {
                Ok(data) => data,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            chunk_counter += 1;
            chatgate_logging::log_stream_chunk(provider.as_str(), chunk_counter, &data);

            if data.trim() == DONE_MARKER {
                return;
            }

            match serde_json::from_str::<Value>(&data) {
                Ok(payload) => {
                    if provider == Provider::Anthropic
                        && payload.get("type").and_then(Value::as_str) == Some(ANTHROPIC_STOP_EVENT)
                    {
                        completed = true;
                    }
                    yield Ok(RawChunk::new(provider, payload));
                }
                Err(e) => {
                    yield Err(StreamError::Malformed(e.to_string()));
                    return;
                }
            }
        }

        if !completed {
            let marker = end_marker(provider).unwrap_or_default();
            tracing::warn!(provider = %provider, chunks = chunk_counter, "stream closed before {}", marker);
            yield Err(StreamError::Transport(format!(
                "connection closed before {}",
                marker
            )));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ok_payloads(results: Vec<Result<String, StreamError>>) -> Vec<String> {
        results.into_iter().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn test_decoder_splits_events() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b"data: {\"a\":1}\n\ndata: {\"a\":2}\n\n");
        assert_eq!(ok_payloads(payloads), vec!["{\"a\":1}", "{\"a\":2}"]);
    }

    #[test]
    fn test_decoder_handles_split_chunks_and_crlf() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: message_start\r\nda").is_empty());
        assert!(decoder.push(b"ta: {\"x\":true}\r\n").is_empty());
        let payloads = decoder.push(b"\r\n");
        assert_eq!(ok_payloads(payloads), vec!["{\"x\":true}"]);
    }

    #[test]
    fn test_decoder_ignores_comments_and_joins_multiline_data() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b": ping\n\ndata:first\ndata: second\n\n");
        assert_eq!(ok_payloads(payloads), vec!["first\nsecond"]);
    }

    #[test]
    fn test_decoder_keeps_multibyte_characters_across_chunks() {
        let mut decoder = SseDecoder::new();
        let text = "data: \"héllo\"\n\n".as_bytes();
        let (head, tail) = text.split_at(9);
        assert!(decoder.push(head).is_empty());
        assert_eq!(ok_payloads(decoder.push(tail)), vec!["\"héllo\""]);
    }

    #[test]
    fn test_decoder_finish_flushes_trailing_event() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: tail").is_empty());
        assert_eq!(decoder.finish().unwrap().unwrap(), "tail");
        assert!(decoder.finish().is_none());
    }

    #[tokio::test]
    async fn test_raw_chunks_stop_at_done_marker() {
        let bytes = stream::iter(vec![
            Ok::<_, std::io::Error>(b"data: {\"n\":1}\n\n".to_vec()),
            Ok(b"data: [DONE]\n\ndata: {\"n\":2}\n\n".to_vec()),
        ]);

        let chunks: Vec<_> = raw_chunks(Provider::OpenAi, bytes).collect().await;
        assert_eq!(
            chunks,
            vec![Ok(RawChunk::new(Provider::OpenAi, json!({"n": 1})))]
        );
    }

    #[tokio::test]
    async fn test_openai_stream_without_done_marker_is_cut_off() {
        let bytes = stream::iter(vec![Ok::<_, std::io::Error>(
            b"data: {\"n\":1}\n\ndata: {\"n\":2}\n\n".to_vec(),
        )]);

        let chunks: Vec<_> = raw_chunks(Provider::OpenAi, bytes).collect().await;
        assert_eq!(chunks.len(), 3);
        assert!(chunks[1].is_ok());
        assert_eq!(
            chunks[2],
            Err(StreamError::Transport("connection closed before [DONE]".to_string()))
        );
    }

    #[tokio::test]
    async fn test_anthropic_stream_needs_message_stop() {
        let complete = stream::iter(vec![Ok::<_, std::io::Error>(
            b"event: message_delta\ndata: {\"type\":\"message_delta\"}\n\nevent: message_stop\ndata: {\"type\":\"message_stop\"}\n\n".to_vec(),
        )]);
        let chunks: Vec<_> = raw_chunks(Provider::Anthropic, complete).collect().await;
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(Result::is_ok));

        let cut_off = stream::iter(vec![Ok::<_, std::io::Error>(
            b"event: message_delta\ndata: {\"type\":\"message_delta\"}\n\n".to_vec(),
        )]);
        let chunks: Vec<_> = raw_chunks(Provider::Anthropic, cut_off).collect().await;
        assert_eq!(chunks.len(), 2);
        assert_eq!(
            chunks[1],
            Err(StreamError::Transport("connection closed before message_stop".to_string()))
        );
    }

    #[tokio::test]
    async fn test_gemini_stream_ends_on_close() {
        let bytes = stream::iter(vec![Ok::<_, std::io::Error>(b"data: {\"n\":1}\n\n".to_vec())]);

        let chunks: Vec<_> = raw_chunks(Provider::Gemini, bytes).collect().await;
        assert_eq!(chunks, vec![Ok(RawChunk::new(Provider::Gemini, json!({"n": 1})))]);
    }

    #[tokio::test]
    async fn test_raw_chunks_report_malformed_json_and_stop() {
        let bytes = stream::iter(vec![Ok::<_, std::io::Error>(
            b"data: {\"n\":1}\n\ndata: {oops\n\ndata: {\"n\":3}\n\n".to_vec(),
        )]);

        let chunks: Vec<_> = raw_chunks(Provider::Anthropic, bytes).collect().await;
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].is_ok());
        assert!(matches!(chunks[1], Err(StreamError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_raw_chunks_surface_transport_errors() {
        let bytes = stream::iter(vec![
            Ok(b"data: {\"n\":1}\n\n".to_vec()),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer")),
            Ok(b"data: {\"n\":2}\n\n".to_vec()),
        ]);

        let chunks: Vec<_> = raw_chunks(Provider::Gemini, bytes).collect().await;
        assert_eq!(chunks.len(), 2);
        assert_eq!(
            chunks[1],
            Err(StreamError::Transport("reset by peer".to_string()))
        );
    }
}
