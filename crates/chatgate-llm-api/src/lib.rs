//! # chatgate-llm-api
//!
//! Provider plumbing for the chat gateway:
//! - credential lookup across the process environment and a client env file
//! - streaming clients for OpenAI, Anthropic and Google Gemini
//! - SSE decoding of provider responses
//! - normalization of provider chunks into [`chatgate_models::StreamEvent`]s
//!
//! Each provider sits behind a cargo feature (`openai`, `anthropic`,
//! `gemini`, all on by default).
//!
//! ## Example
//!
//! ```rust,no_run
//! use chatgate_llm_api::{normalize, ClientFactory, CredentialResolver, EnvFileSource, EventContext, StreamOpener};
//! use chatgate_models::{Message, ModelRegistry};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = ModelRegistry::builtin();
//!     let config = registry.resolve(Some("GPT-4o Mini"))?;
//!     let credential = CredentialResolver::with_env_file(EnvFileSource::default()).resolve(&config)?;
//!
//!     let factory = ClientFactory::default();
//!     let stream = factory
//!         .open_stream(config.provider, &config.model_id, &credential, &[Message::user("Hello!")], None)
//!         .await?;
//!
//!     let mut events = Box::pin(normalize(stream, EventContext::new(None, config.model_id.clone()), None));
//!     while let Some(event) = events.next().await {
//!         println!("{}", serde_json::to_string(&event)?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod normalizer;


// Re-export commonly used types
pub use client::{ProviderClient, ProviderStream, RawChunk};

pub use config::{
    get_default_url_for_provider, join_endpoint, ClientFactory, Credential, CredentialResolver,
    CredentialSource, EnvFileSource, ProcessEnv, ProviderEndpoints, StreamOpener,
    ANTHROPIC_API_URL, GEMINI_API_URL, OPENAI_API_URL,
};

pub use error::{AdapterError, MissingCredential, StreamError};
pub use normalizer::{map_chunk, normalize, EventContext};
