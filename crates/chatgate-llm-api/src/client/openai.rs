use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use chatgate_models::{Message, Provider, Role};

use super::{send_streaming_request, ProviderClient, ProviderStream};
use crate::config::{join_endpoint, Credential};
use crate::error::AdapterError;

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// OpenAI chat completions client (streaming only)
pub struct OpenAiClient {
    http: reqwest::Client,
    url: String,
    model: String,
    credential: Credential,
    headers: HeaderMap,
}

impl OpenAiClient {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        model: String,
        credential: Credential,
    ) -> Result<Self, AdapterError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", credential.expose()))
            .map_err(|_| AdapterError::open(Provider::OpenAi, "API key contains invalid characters"))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        Ok(Self {
            http,
            url: join_endpoint(base_url, CHAT_COMPLETIONS_PATH),
            model,
            credential,
            headers,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn build_request(&self, messages: &[Message]) -> Value {
        let messages: Vec<Value> = messages
            .iter()
            .map(|msg| {
                // Tool results need a tool_call_id we never have; send them as user turns
                let role = match msg.role {
                    Role::Tool => Role::User,
                    role => role,
                };
                serde_json::json!({
                    "role": role.as_str(),
                    "content": msg.text(),
                })
            })
            .collect();

        serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": true,
            "stream_options": { "include_usage": true },
        })
    }
}

#[async_trait]
impl ProviderClient for OpenAiClient {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    async fn open_stream(&self, messages: &[Message]) -> Result<ProviderStream, AdapterError> {
        let request = self.build_request(messages);
        send_streaming_request(
            &self.http,
            Provider::OpenAi,
            &self.url,
            self.headers.clone(),
            &request,
            &self.credential,
        )
        .await
    }
}
