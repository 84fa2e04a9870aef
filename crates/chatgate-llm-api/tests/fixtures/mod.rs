#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::matchers::*;
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_API_KEY: &str = "test-api-key";

/// Render payloads as an SSE body
pub fn sse_body(payloads: &[Value], done_marker: bool) -> String {
    let mut body: String = payloads
        .iter()
        .map(|p| format!("data: {}\n\n", p))
        .collect();
    if done_marker {
        body.push_str("data: [DONE]\n\n");
    }
    body
}

fn sse_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/event-stream")
}

/// Mock server standing in for all three providers
pub struct ProviderMockServer {
    server: MockServer,
}

impl ProviderMockServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub async fn received_requests(&self) -> Vec<wiremock::Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Mock an OpenAI stream emitting `parts` as content deltas
    pub async fn mock_openai_stream(&self, parts: &[&str]) {
        let mut payloads: Vec<Value> = parts
            .iter()
            .map(|p| json!({"object":"chat.completion.chunk","choices":[{"index":0,"delta":{"content":p}}]}))
            .collect();
        payloads.push(json!({"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}));
        payloads.push(json!({"choices":[],"usage":{"prompt_tokens":9,"completion_tokens":3,"total_tokens":12}}));

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-api-key"))
            .and(body_partial_json(json!({
                "stream": true,
                "stream_options": {"include_usage": true}
            })))
            .respond_with(sse_response(sse_body(&payloads, true)))
            .mount(&self.server)
            .await;
    }

    /// Mock an Anthropic stream with one thinking block and one text block
    pub async fn mock_anthropic_stream(&self, thinking: &str, text: &str) {
        let payloads = vec![
            json!({"type":"message_start","message":{"id":"msg_test123","usage":{"input_tokens":10,"output_tokens":1}}}),
            json!({"type":"content_block_start","index":0,"content_block":{"type":"thinking","thinking":""}}),
            json!({"type":"content_block_delta","index":0,"delta":{"type":"thinking_delta","thinking":thinking}}),
            json!({"type":"content_block_stop","index":0}),
            json!({"type":"ping"}),
            json!({"type":"content_block_delta","index":1,"delta":{"type":"text_delta","text":text}}),
            json!({"type":"message_delta","delta":{"stop_reason":"end_turn"},"usage":{"output_tokens":20}}),
            json!({"type":"message_stop"}),
        ];
        let body: String = payloads
            .iter()
            .map(|p| format!("event: {}\ndata: {}\n\n", p["type"].as_str().unwrap_or("message"), p))
            .collect();

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", TEST_API_KEY))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({"max_tokens": 4096, "stream": true})))
            .respond_with(sse_response(body))
            .mount(&self.server)
            .await;
    }

    /// Mock a Gemini stream emitting `parts` as text, one chunk each
    pub async fn mock_gemini_stream(&self, model: &str, parts: &[&str]) {
        let mut payloads: Vec<Value> = parts
            .iter()
            .map(|p| json!({"candidates":[{"content":{"role":"model","parts":[{"text":p}]}}]}))
            .collect();
        payloads.push(json!({
            "candidates":[{"content":{"role":"model","parts":[]},"finishReason":"STOP"}],
            "usageMetadata":{"promptTokenCount":4,"candidatesTokenCount":2,"totalTokenCount":6}
        }));

        Mock::given(method("POST"))
            .and(path(format!("/v1beta/models/{}:streamGenerateContent", model)))
            .and(query_param("alt", "sse"))
            .and(header("x-goog-api-key", TEST_API_KEY))
            .respond_with(sse_response(sse_body(&payloads, false)))
            .mount(&self.server)
            .await;
    }

    /// Mock an OpenAI stream that closes without the `[DONE]` marker
    pub async fn mock_openai_stream_cut_off(&self, parts: &[&str]) {
        let mut payloads: Vec<Value> = parts
            .iter()
            .map(|p| json!({"choices":[{"index":0,"delta":{"content":p}}]}))
            .collect();
        payloads.push(json!({"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}));

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(sse_response(sse_body(&payloads, false)))
            .mount(&self.server)
            .await;
    }

    /// Mock a stream that breaks off with a provider error event
    pub async fn mock_anthropic_stream_error(&self, delivered: &str) {
        let payloads = vec![
            json!({"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":delivered}}),
            json!({"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}),
        ];

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(sse_response(sse_body(&payloads, false)))
            .mount(&self.server)
            .await;
    }

    /// Mock an error status before any stream data
    pub async fn mock_error_status(&self, api_path: &str, status: u16, message: &str) {
        Mock::given(method("POST"))
            .and(path(api_path))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": {"message": message, "type": "invalid_request_error"}
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock a stream whose second payload is not JSON
    pub async fn mock_openai_malformed(&self) {
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\ndata: {not json\n\n".to_string();

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(sse_response(body))
            .mount(&self.server)
            .await;
    }
}
