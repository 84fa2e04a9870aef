// chatgate - streaming chat gateway in front of OpenAI, Anthropic and Gemini
pub mod app;
pub mod cli;
pub mod config;
pub mod web;

pub use cli::{Cli, Commands, ServeArgs};
pub use config::ServerConfig;
pub use web::{create_router, AppState, GatewayError, GatewaySettings, WebServer};
