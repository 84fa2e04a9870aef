use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use chatgate_logging::LogFormat;

#[derive(Parser, Debug)]
#[command(name = "chatgate")]
#[command(about = "Streaming chat gateway for OpenAI, Anthropic and Gemini models")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", env = "CHATGATE_LOG_FORMAT", global = true)]
    pub log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP gateway
    Serve(ServeArgs),
    /// List the models the gateway can route to
    Models,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1", env = "CHATGATE_BIND")]
    pub bind: String,

    /// Port to listen on
    #[arg(long, default_value = "3000", env = "CHATGATE_PORT")]
    pub port: u16,

    /// Client env file consulted for provider API keys after the process environment
    #[arg(long, value_name = "PATH", default_value = ".env", env = "CHATGATE_ENV_FILE")]
    pub env_file: PathBuf,

    /// Model used when a request names none
    #[arg(long, value_name = "MODEL", env = "CHATGATE_DEFAULT_MODEL")]
    pub default_model: Option<String>,

    /// Seconds to wait for the next provider chunk before failing the stream (0 disables)
    #[arg(long, value_name = "SECS", default_value = "120", env = "CHATGATE_STREAM_IDLE_TIMEOUT_SECS")]
    pub stream_idle_timeout_secs: u64,

    /// Seconds allowed for connecting to a provider
    #[arg(long, value_name = "SECS", default_value = "10", env = "CHATGATE_CONNECT_TIMEOUT_SECS")]
    pub connect_timeout_secs: u64,

    /// OpenAI API base URL
    #[arg(long, value_name = "URL", env = "OPENAI_BASE_URL")]
    pub openai_base_url: Option<String>,

    /// Anthropic API base URL
    #[arg(long, value_name = "URL", env = "ANTHROPIC_BASE_URL")]
    pub anthropic_base_url: Option<String>,

    /// Gemini API base URL
    #[arg(long, value_name = "URL", env = "GEMINI_BASE_URL")]
    pub gemini_base_url: Option<String>,
}
