use async_trait::async_trait;

use chatgate_models::{Message, Provider};

use crate::client::{ProviderClient, ProviderStream};
use crate::config::{Credential, ProviderEndpoints};
use crate::error::AdapterError;

#[cfg(feature = "anthropic")]
use crate::client::anthropic::AnthropicClient;
#[cfg(feature = "gemini")]
use crate::client::gemini::GeminiClient;
#[cfg(feature = "openai")]
use crate::client::openai::OpenAiClient;

/// Opens a provider stream for one chat request.
///
/// The HTTP layer only talks to this trait, so it can be driven by a stub
/// in tests.
#[async_trait]
pub trait StreamOpener: Send + Sync {
    async fn open_stream(
        &self,
        provider: Provider,
        model_id: &str,
        credential: &Credential,
        messages: &[Message],
        conversation_id: Option<&str>,
    ) -> Result<ProviderStream, AdapterError>;
}

/// Client factory for creating provider clients
#[derive(Debug, Clone, Default)]
pub struct ClientFactory {
    http: reqwest::Client,
    endpoints: ProviderEndpoints,
}

impl ClientFactory {
    pub fn new(http: reqwest::Client, endpoints: ProviderEndpoints) -> Self {
        Self { http, endpoints }
    }

    pub fn with_endpoints(endpoints: ProviderEndpoints) -> Self {
        Self::new(reqwest::Client::new(), endpoints)
    }

    pub fn endpoints(&self) -> &ProviderEndpoints {
        &self.endpoints
    }

    /// Create the client for `provider`.
    ///
    /// Providers left out of the build fail with
    /// [`AdapterError::UnsupportedProvider`] without touching the network.
    #[allow(unreachable_patterns)]
    pub fn create(
        &self,
        provider: Provider,
        model_id: &str,
        credential: &Credential,
    ) -> Result<Box<dyn ProviderClient>, AdapterError> {
        let base_url = self.endpoints.base_url(provider);

        match provider {
            #[cfg(feature = "openai")]
            Provider::OpenAi => Ok(Box::new(OpenAiClient::new(
                self.http.clone(),
                base_url,
                model_id.to_string(),
                credential.clone(),
            )?)),
            #[cfg(feature = "anthropic")]
            Provider::Anthropic => Ok(Box::new(AnthropicClient::new(
                self.http.clone(),
                base_url,
                model_id.to_string(),
                credential.clone(),
            )?)),
            #[cfg(feature = "gemini")]
            Provider::Gemini => Ok(Box::new(GeminiClient::new(
                self.http.clone(),
                base_url,
                model_id.to_string(),
                credential.clone(),
            )?)),
            _ => {
                let _ = (base_url, model_id, credential);
                Err(AdapterError::UnsupportedProvider(provider))
            }
        }
    }
}

#[async_trait]
impl StreamOpener for ClientFactory {
    async fn open_stream(
        &self,
        provider: Provider,
        model_id: &str,
        credential: &Credential,
        messages: &[Message],
        conversation_id: Option<&str>,
    ) -> Result<ProviderStream, AdapterError> {
        let client = self.create(provider, model_id, credential)?;

        tracing::info!(
            provider = %provider,
            model = model_id,
            conversation_id = conversation_id.unwrap_or("-"),
            messages = messages.len(),
            "opening provider stream"
        );

        client.open_stream(messages).await
    }
}
