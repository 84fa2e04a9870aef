use chatgate_models::Provider;

pub mod credentials;
pub mod factory;

pub use credentials::{Credential, CredentialResolver, CredentialSource, EnvFileSource, ProcessEnv};
pub use factory::{ClientFactory, StreamOpener};

/// Default OpenAI API base URL
pub const OPENAI_API_URL: &str = "https://api.openai.com";

/// Default Anthropic API base URL
pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";

/// Default Gemini API base URL
pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Get the default base URL for a given provider
pub fn get_default_url_for_provider(provider: Provider) -> &'static str {
    match provider {
        Provider::OpenAi => OPENAI_API_URL,
        Provider::Anthropic => ANTHROPIC_API_URL,
        Provider::Gemini => GEMINI_API_URL,
    }
}

/// Base URLs for each provider's API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub openai: String,
    pub anthropic: String,
    pub gemini: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            openai: OPENAI_API_URL.to_string(),
            anthropic: ANTHROPIC_API_URL.to_string(),
            gemini: GEMINI_API_URL.to_string(),
        }
    }
}

impl ProviderEndpoints {
    /// Point every provider at the same base URL (mock servers, gateways)
    pub fn all(base_url: &str) -> Self {
        Self {
            openai: base_url.to_string(),
            anthropic: base_url.to_string(),
            gemini: base_url.to_string(),
        }
    }

    pub fn base_url(&self, provider: Provider) -> &str {
        match provider {
            Provider::OpenAi => &self.openai,
            Provider::Anthropic => &self.anthropic,
            Provider::Gemini => &self.gemini,
        }
    }
}

/// Join a base URL and an API path.
///
/// A base that already ends with the path is used as-is, so both
/// `https://host` and `https://host/v1/messages` work.
pub fn join_endpoint(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with(path) {
        return base.to_string();
    }
    format!("{base}{path}")
}
