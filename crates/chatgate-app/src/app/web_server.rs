use anyhow::Result;
use colored::Colorize;

use crate::config::ServerConfig;
use crate::web::server::{WebServer, WebServerConfig};

/// Run the web server
pub async fn run_web_server(config: ServerConfig) -> Result<()> {
    let state = config.build_state()?;

    println!("{}", "🌐 Starting chatgate...".bright_cyan().bold());
    println!("   Address: {}", config.bind_addr.to_string().bright_white());
    println!("   Default model: {}", state.registry.default_model().bright_white());
    println!(
        "   Credential sources: {}",
        state.credentials.source_names().join(" → ")
    );
    match config.idle_timeout {
        Some(limit) => println!("   Stream idle timeout: {}s", limit.as_secs()),
        None => println!("   Stream idle timeout: {}", "disabled".yellow()),
    }
    println!("   Endpoints:");
    println!("     POST http://{}/api/chat", config.bind_addr);
    println!("     GET  http://{}/api/models", config.bind_addr);
    println!("     GET  http://{}/api/health", config.bind_addr);

    let server = WebServer::new(
        WebServerConfig {
            bind_addr: config.bind_addr,
        },
        state,
    );
    server.start().await?;

    Ok(())
}
