use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use chatgate_llm_api::{ClientFactory, CredentialResolver, EnvFileSource, ProviderEndpoints};
use chatgate_models::ModelRegistry;

use crate::cli::ServeArgs;
use crate::web::{AppState, GatewaySettings};

/// Everything `serve` needs, validated
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub env_file: PathBuf,
    pub default_model: Option<String>,
    pub idle_timeout: Option<Duration>,
    pub connect_timeout: Duration,
    pub endpoints: ProviderEndpoints,
}

impl ServerConfig {
    pub fn from_args(args: &ServeArgs) -> Result<Self> {
        let bind_addr: SocketAddr = format!("{}:{}", args.bind, args.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", args.bind, args.port))?;

        let mut endpoints = ProviderEndpoints::default();
        if let Some(url) = non_empty(&args.openai_base_url) {
            endpoints.openai = url;
        }
        if let Some(url) = non_empty(&args.anthropic_base_url) {
            endpoints.anthropic = url;
        }
        if let Some(url) = non_empty(&args.gemini_base_url) {
            endpoints.gemini = url;
        }

        Ok(Self {
            bind_addr,
            env_file: args.env_file.clone(),
            default_model: non_empty(&args.default_model),
            idle_timeout: idle_timeout(args.stream_idle_timeout_secs),
            connect_timeout: Duration::from_secs(args.connect_timeout_secs),
            endpoints,
        })
    }

    /// Model registry with the configured default applied
    pub fn registry(&self) -> Result<ModelRegistry> {
        let registry = ModelRegistry::builtin();
        match &self.default_model {
            Some(name) => registry
                .with_default_model(name)
                .context("invalid --default-model"),
            None => Ok(registry),
        }
    }

    /// Build the shared request state: registry, credentials and provider clients
    pub fn build_state(&self) -> Result<AppState> {
        let registry = self.registry()?;

        let env_file = EnvFileSource::load_optional(&self.env_file)
            .with_context(|| format!("failed to read env file {}", self.env_file.display()))?;
        tracing::info!(
            path = %self.env_file.display(),
            entries = env_file.len(),
            "client env file loaded"
        );
        let credentials = CredentialResolver::with_env_file(env_file);

        let http = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .build()
            .context("failed to build HTTP client")?;
        let opener = ClientFactory::new(http, self.endpoints.clone());

        Ok(AppState::new(
            registry,
            credentials,
            Arc::new(opener),
            GatewaySettings {
                idle_timeout: self.idle_timeout,
            },
        ))
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn idle_timeout(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    use crate::cli::{Cli, Commands};

    fn serve_args(extra: &[&str]) -> ServeArgs {
        let mut argv = vec!["chatgate", "serve"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Serve(args) => args,
            other => panic!("expected serve, got {:?}", other),
        }
    }

    #[test]
    fn test_explicit_flags() {
        let config = ServerConfig::from_args(&serve_args(&[
            "--bind",
            "0.0.0.0",
            "--port",
            "8181",
            "--stream-idle-timeout-secs",
            "0",
            "--anthropic-base-url",
            "http://localhost:9999",
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:8181".parse::<SocketAddr>().unwrap());
        assert_eq!(config.idle_timeout, None);
        assert_eq!(config.endpoints.anthropic, "http://localhost:9999");
    }

    #[test]
    fn test_invalid_bind_address_is_rejected() {
        let err = ServerConfig::from_args(&serve_args(&["--bind", "not an address"])).unwrap_err();
        assert!(err.to_string().contains("invalid bind address"));
    }

    #[test]
    fn test_default_model_override() {
        let mut config = ServerConfig::from_args(&serve_args(&["--default-model", "Gemini Pro"])).unwrap();
        assert_eq!(config.registry().unwrap().default_model(), "Gemini Pro");

        config.default_model = Some("Nonexistent".to_string());
        let err = config.registry().unwrap_err();
        assert!(format!("{:#}", err).contains("Model \"Nonexistent\" not found"));
    }

    #[test]
    fn test_build_state_reads_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let env_path = dir.path().join("client.env");
        std::fs::write(&env_path, "GEMINI_API_KEY=from-client-file\n").unwrap();

        let mut config = ServerConfig::from_args(&serve_args(&[])).unwrap();
        config.env_file = env_path;

        let state = config.build_state().unwrap();
        assert_eq!(state.settings.idle_timeout, Some(Duration::from_secs(120)));
        assert_eq!(
            state.credentials.source_names().last().map(String::as_str),
            Some(config.env_file.display().to_string().as_str())
        );
    }
}
