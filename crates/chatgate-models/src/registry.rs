use serde::{Deserialize, Serialize};
use std::fmt;

/// LLM vendors the gateway can stream from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
    Gemini,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::OpenAi, Provider::Anthropic, Provider::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Gemini => "gemini",
        }
    }

    /// Vendor name shown in the model picker
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::Anthropic => "Anthropic",
            Provider::Gemini => "Google",
        }
    }

    /// Environment key holding this provider's API key
    pub fn credential_key(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Concrete target for a logical model name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    pub provider: Provider,
    pub model_id: String,
    pub credential_key: String,
}

#[derive(Debug, Clone, Copy)]
pub struct CatalogModel {
    pub id: &'static str,
    pub name: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct CatalogProvider {
    pub provider: Provider,
    pub models: &'static [CatalogModel],
}

/// Built-in models, grouped by provider in display order
pub const PROVIDER_CATALOG: &[CatalogProvider] = &[
    CatalogProvider {
        provider: Provider::OpenAi,
        models: &[
            CatalogModel { id: "o3-mini", name: "o3-mini" },
            CatalogModel { id: "gpt-4o-mini", name: "GPT-4o Mini" },
            CatalogModel { id: "gpt-4o", name: "GPT-4o" },
            CatalogModel { id: "gpt-4-turbo", name: "GPT-4 Turbo" },
            CatalogModel { id: "gpt-3.5-turbo", name: "GPT-3.5 Turbo" },
        ],
    },
    CatalogProvider {
        provider: Provider::Anthropic,
        models: &[
            CatalogModel { id: "claude-sonnet-4-5", name: "Claude Sonnet 4.5" },
            CatalogModel { id: "claude-3-5-sonnet-latest", name: "Claude 3.5 Sonnet" },
            CatalogModel { id: "claude-3-5-haiku-latest", name: "Claude 3.5 Haiku" },
        ],
    },
    CatalogProvider {
        provider: Provider::Gemini,
        models: &[
            CatalogModel { id: "gemini-pro", name: "Gemini Pro" },
            CatalogModel { id: "gemini-2.0-flash-exp", name: "Gemini 2.0 Flash" },
        ],
    },
];

/// Model used when a request names none
pub const DEFAULT_MODEL: &str = "GPT-4o Mini";

/// Requested model name is not registered
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Model \"{requested}\" not found. Available models: {}", available.join(", "))]
pub struct UnknownModel {
    pub requested: String,
    pub available: Vec<String>,
}

/// Read-only mapping of logical model names to provider targets.
///
/// Built once at startup and shared between requests.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    entries: Vec<(String, ModelConfig)>,
    default_model: String,
}

impl ModelRegistry {
    /// Registry over the built-in catalog with the stock default model
    pub fn builtin() -> Self {
        Self {
            entries: collect_entries(PROVIDER_CATALOG),
            default_model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Build a registry from a catalog; later duplicates of a name are ignored
    pub fn from_catalog(
        catalog: &[CatalogProvider],
        default_model: &str,
    ) -> Result<Self, UnknownModel> {
        let registry = Self {
            entries: collect_entries(catalog),
            default_model: String::new(),
        };
        registry.with_default_model(default_model)
    }

    /// Replace the default model; the name must already be registered
    pub fn with_default_model(mut self, name: &str) -> Result<Self, UnknownModel> {
        let name = name.trim();
        if self.lookup(name).is_none() {
            return Err(self.unknown(name));
        }
        self.default_model = name.to_string();
        Ok(self)
    }

    /// Resolve a logical model name.
    ///
    /// `None` or an empty name selects the default model. Otherwise the
    /// name is trimmed and matched exactly (case-sensitive).
    pub fn resolve(&self, name: Option<&str>) -> Result<ModelConfig, UnknownModel> {
        let requested = match name {
            None | Some("") => self.default_model.as_str(),
            Some(name) => name,
        };
        self.lookup(requested.trim())
            .cloned()
            .ok_or_else(|| self.unknown(requested))
    }

    /// All registered names, in registration order
    pub fn available_models(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Registered models grouped by provider, for listing
    pub fn providers(&self) -> Vec<(Provider, Vec<(String, String)>)> {
        let mut groups: Vec<(Provider, Vec<(String, String)>)> = Vec::new();
        for (name, config) in &self.entries {
            let pair = (config.model_id.clone(), name.clone());
            match groups.iter_mut().find(|(p, _)| *p == config.provider) {
                Some((_, models)) => models.push(pair),
                None => groups.push((config.provider, vec![pair])),
            }
        }
        groups
    }

    fn lookup(&self, name: &str) -> Option<&ModelConfig> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, config)| config)
    }

    fn unknown(&self, requested: &str) -> UnknownModel {
        UnknownModel {
            requested: requested.to_string(),
            available: self.available_models(),
        }
    }
}

fn collect_entries(catalog: &[CatalogProvider]) -> Vec<(String, ModelConfig)> {
    let mut entries: Vec<(String, ModelConfig)> = Vec::new();
    for group in catalog {
        for model in group.models {
            if entries.iter().any(|(name, _)| name == model.name) {
                continue;
            }
            entries.push((
                model.name.to_string(),
                ModelConfig {
                    provider: group.provider,
                    model_id: model.id.to_string(),
                    credential_key: group.provider.credential_key().to_string(),
                },
            ));
        }
    }
    entries
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
