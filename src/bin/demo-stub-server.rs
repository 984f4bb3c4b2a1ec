#![forbid(unsafe_code)]
//! Stub REST backend for the Cosmos Demo wallet

use clap::Parser;
use cosmos_demo::api::run_stub_server;
use cosmos_demo::config::{load_config, DEFAULT_CONFIG_FILE};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Port to listen on (overrides the configuration and PORT)
    #[arg(long)]
    port: Option<u16>,
    /// Chain id reported by /node_status
    #[arg(long)]
    chain_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = load_config(&cli.config)?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(chain_id) = cli.chain_id {
        config.server.chain_id = chain_id;
    }

    run_stub_server(&config.server).await?;
    Ok(())
}
