use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use chatgate_models::{Message, Provider, Role};

use super::{
    combined_system_prompt, conversation_turns, send_streaming_request, ProviderClient,
    ProviderStream,
};
use crate::config::{join_endpoint, Credential};
use crate::error::AdapterError;

/// Google Gemini client using `streamGenerateContent` in SSE mode
pub struct GeminiClient {
    http: reqwest::Client,
    url: String,
    credential: Credential,
    headers: HeaderMap,
}

impl GeminiClient {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        model: String,
        credential: Credential,
    ) -> Result<Self, AdapterError> {
        let mut api_key = HeaderValue::from_str(credential.expose()).map_err(|_| {
            AdapterError::open(Provider::Gemini, "API key contains invalid characters")
        })?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("x-goog-api-key"), api_key);

        let url = stream_url(base_url, &model);

        Ok(Self {
            http,
            url,
            credential,
            headers,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn build_request(&self, messages: &[Message]) -> Value {
        let contents: Vec<Value> = conversation_turns(messages)
            .map(|(role, text)| {
                let role = match role {
                    Role::Assistant => "model",
                    _ => "user",
                };
                serde_json::json!({
                    "role": role,
                    "parts": [{ "text": text }],
                })
            })
            .collect();

        let mut request = serde_json::json!({ "contents": contents });

        if let Some(system_content) = combined_system_prompt(messages) {
            request["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": system_content }],
            });
        }

        request
    }
}

/// Query string selecting SSE framing for `streamGenerateContent`
const SSE_QUERY: &str = "?alt=sse";

/// `streamGenerateContent` URL for `model`; a base that already names the
/// endpoint is kept as-is
fn stream_url(base_url: &str, model: &str) -> String {
    let base = base_url.trim_end_matches(SSE_QUERY);
    let endpoint = join_endpoint(
        base,
        &format!("/v1beta/models/{}:streamGenerateContent", model),
    );
    format!("{}{}", endpoint, SSE_QUERY)
}

#[async_trait]
impl ProviderClient for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn open_stream(&self, messages: &[Message]) -> Result<ProviderStream, AdapterError> {
        let request = self.build_request(messages);
        send_streaming_request(
            &self.http,
            Provider::Gemini,
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
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_request_maps_roles_and_system_instruction() {
        let client = GeminiClient::new(
            reqwest::Client::new(),
            "https://generativelanguage.googleapis.com/",
            "gemini-2.0-flash-exp".to_string(),
            Credential::new("AIza-test"),
        )
        .unwrap();

        let body = client.build_request(&[
            Message::new(Role::System, "be kind"),
            Message::user("hi"),
            Message::new(Role::Assistant, "hello"),
        ]);

        assert_eq!(
            client.url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-exp:streamGenerateContent?alt=sse"
        );
        assert_eq!(
            body,
            json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "hi"}]},
                    {"role": "model", "parts": [{"text": "hello"}]}
                ],
                "systemInstruction": {"parts": [{"text": "be kind"}]}
            })
        );
    }

    #[test]
    fn test_stream_url_does_not_repeat_endpoint_path() {
        let expected = "https://proxy.local/v1beta/models/gemini-pro:streamGenerateContent?alt=sse";
        for base in [
            "https://proxy.local",
            "https://proxy.local/",
            "https://proxy.local/v1beta/models/gemini-pro:streamGenerateContent",
            "https://proxy.local/v1beta/models/gemini-pro:streamGenerateContent?alt=sse",
        ] {
            assert_eq!(stream_url(base, "gemini-pro"), expected, "base: {}", base);
        }
    }
}
