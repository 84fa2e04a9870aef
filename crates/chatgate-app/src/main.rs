use anyhow::Result;
use clap::Parser;

use chatgate::app::{print_models, run_web_server};
use chatgate::{Cli, Commands, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    chatgate_logging::init_tracing(cli.log_format)?;

    match cli.command {
        Commands::Serve(args) => {
            let config = ServerConfig::from_args(&args)?;
            run_web_server(config).await
        }
        Commands::Models => {
            print_models(&chatgate_models::ModelRegistry::builtin());
            Ok(())
        }
    }
}
