use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use chatgate_models::ModelConfig;

use crate::error::MissingCredential;

/// Provider API key, alive for a single request
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(SecretString::from(key.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Credential({})",
            chatgate_logging::mask_secret(self.expose())
        )
    }
}

/// A place credentials can be read from
pub trait CredentialSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Option<String>;
}

/// The server process environment
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl CredentialSource for ProcessEnv {
    fn name(&self) -> &str {
        "process environment"
    }

    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

/// Variables from a dotenv-style client env file.
///
/// The file is parsed once; the process environment is never modified.
#[derive(Debug, Default, Clone)]
pub struct EnvFileSource {
    label: String,
    vars: HashMap<String, String>,
}

impl EnvFileSource {
    pub fn load(path: &Path) -> Result<Self, dotenvy::Error> {
        let vars = dotenvy::from_path_iter(path)?.collect::<Result<HashMap<_, _>, _>>()?;
        Ok(Self {
            label: path.display().to_string(),
            vars,
        })
    }

    /// Like [`EnvFileSource::load`], but a missing file yields an empty source
    pub fn load_optional(path: &Path) -> Result<Self, dotenvy::Error> {
        match Self::load(path) {
            Err(e) if e.not_found() => {
                tracing::debug!(path = %path.display(), "client env file not found");
                Ok(Self {
                    label: path.display().to_string(),
                    vars: HashMap::new(),
                })
            }
            other => other,
        }
    }

    pub fn from_pairs<I, K, V>(label: &str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            label: label.to_string(),
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl CredentialSource for EnvFileSource {
    fn name(&self) -> &str {
        &self.label
    }

    fn get(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// Looks up provider keys across ordered sources; first non-empty value wins
#[derive(Clone)]
pub struct CredentialResolver {
    sources: Vec<Arc<dyn CredentialSource>>,
}

impl CredentialResolver {
    pub fn new(sources: Vec<Arc<dyn CredentialSource>>) -> Self {
        Self { sources }
    }

    /// Process environment first, then the client env file
    pub fn with_env_file(env_file: EnvFileSource) -> Self {
        Self::new(vec![Arc::new(ProcessEnv), Arc::new(env_file)])
    }

    pub fn resolve(&self, config: &ModelConfig) -> Result<Credential, MissingCredential> {
        self.resolve_key(&config.credential_key)
    }

    pub fn resolve_key(&self, key: &str) -> Result<Credential, MissingCredential> {
        for source in &self.sources {
            if let Some(value) = source.get(key) {
                let value = value.trim();
                if value.is_empty() {
                    continue;
                }
                tracing::debug!(key, source = source.name(), "credential resolved");
                return Ok(Credential::new(value));
            }
        }

        Err(MissingCredential {
            key: key.to_string(),
        })
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }
}

impl fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("sources", &self.source_names())
            .finish()
    }
}
