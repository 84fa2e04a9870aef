use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use chatgate_models::{Message, Provider};

use super::{
    combined_system_prompt, conversation_turns, send_streaming_request, ProviderClient,
    ProviderStream,
};
use crate::config::{join_endpoint, Credential};
use crate::error::AdapterError;

const MESSAGES_PATH: &str = "/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

/// Anthropic client using the native Messages API
pub struct AnthropicClient {
    http: reqwest::Client,
    url: String,
    model: String,
    credential: Credential,
    headers: HeaderMap,
}

impl AnthropicClient {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        model: String,
        credential: Credential,
    ) -> Result<Self, AdapterError> {
        let mut api_key = HeaderValue::from_str(credential.expose()).map_err(|_| {
            AdapterError::open(Provider::Anthropic, "API key contains invalid characters")
        })?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("x-api-key"), api_key);
        headers.insert(
            HeaderName::from_static("anthropic-version"),
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        Ok(Self {
            http,
            url: join_endpoint(base_url, MESSAGES_PATH),
            model,
            credential,
            headers,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn build_request(&self, messages: &[Message]) -> Value {
        let anthropic_messages: Vec<Value> = conversation_turns(messages)
            .map(|(role, text)| {
                serde_json::json!({
                    "role": role.as_str(),
                    "content": [{ "type": "text", "text": text }],
                })
            })
            .collect();

        let mut request = serde_json::json!({
            "model": self.model,
            "messages": anthropic_messages,
            "max_tokens": MAX_TOKENS,
            "stream": true,
        });

        if let Some(system_content) = combined_system_prompt(messages) {
            request["system"] = Value::String(system_content);
        }

        request
    }
}

#[async_trait]
impl ProviderClient for AnthropicClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn open_stream(&self, messages: &[Message]) -> Result<ProviderStream, AdapterError> {
        let request = self.build_request(messages);
        send_streaming_request(
            &self.http,
            Provider::Anthropic,
            &self.url,
            self.headers.clone(),
            &request,
            &self.credential,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatgate_models::Role;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn client() -> AnthropicClient {
        AnthropicClient::new(
            reqwest::Client::new(),
            "https://api.anthropic.com",
            "claude-3-5-haiku-latest".to_string(),
            Credential::new("sk-ant-test"),
        )
        .unwrap()
    }

    #[test]
    fn test_system_messages_move_to_system_field() {
        let body = client().build_request(&[
            Message::new(Role::System, "rule one"),
            Message::user("hello"),
            Message::new(Role::Assistant, "hi!"),
            Message::new(Role::System, "rule two"),
        ]);

        assert_eq!(body["system"], "rule one\n\nrule two");
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["stream"], true);
        assert_eq!(
            body["messages"],
            json!([
                {"role": "user", "content": [{"type": "text", "text": "hello"}]},
                {"role": "assistant", "content": [{"type": "text", "text": "hi!"}]}
            ])
        );
    }

    #[test]
    fn test_no_system_field_without_system_messages() {
        let body = client().build_request(&[Message::user("hello")]);
        assert!(body.get("system").is_none());
    }

    #[test]
    fn test_headers_and_url() {
        let client = client();
        assert_eq!(client.url(), "https://api.anthropic.com/v1/messages");
        assert_eq!(client.headers["anthropic-version"], "2023-06-01");
        assert_eq!(client.headers["x-api-key"], "sk-ant-test");
    }
}
