use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use ghost_jwt::comms::http_api;
use ghost_jwt::config::Config;
use ghost_jwt::security::token::{mint_json, SystemClock};
use ghost_jwt::utils;

#[derive(Parser)]
#[command(name = "ghost-jwt", version, about = "Ghost Admin API token issuer")]
struct AppCli {
    /// Config file path (JSON); defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP token endpoint
    Serve {
        /// Overrides the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print a token for one admin key and exit
    Mint {
        #[arg(long, env = "GHOST_ADMIN_API_KEY", hide_env_values = true)]
        api_key: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    utils::logging::init();

    let args = AppCli::parse();

    match args.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Mint { api_key } => {
            println!("{}", mint_json(&api_key, &SystemClock)?);
        }
        Commands::Serve { port } => {
            let mut config = Config::load(args.config.as_deref())?;
            if let Some(port) = port {
                config.port = port;
            }
            info!("Starting ghost-jwt {} on port {}", ghost_jwt::VERSION, config.port);
            http_api::serve(config).await?;
        }
    }

    Ok(())
}
