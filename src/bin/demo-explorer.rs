#![forbid(unsafe_code)]
//! Block explorer for the Cosmos Demo chain (generated data)

use clap::{Parser, Subcommand};
use colored::*;
use cosmos_demo::cli::{self, with_spinner};
use cosmos_demo::config::{load_config, DEFAULT_CONFIG_FILE};
use cosmos_demo::types::{TxKind, TxStatus};
use cosmos_demo::{Explorer, MockExplorer, TxFilter};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Skip the simulated network latency
    #[arg(long)]
    fast: bool,
    /// Seed the generator for reproducible output
    #[arg(long)]
    seed: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the latest blocks
    Blocks {
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },
    /// Shows one block and its transactions
    Block { height: u64 },
    /// Lists recent transactions
    Txs {
        #[arg(short = 'n', long)]
        count: Option<usize>,
        #[arg(long)]
        status: Option<TxStatus>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long = "type")]
        kind: Option<TxKind>,
    },
    /// Shows one transaction
    Tx { hash: String },
    /// Shows chain-wide numbers
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::WARN)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let page_size = config.explorer.page_size;

    let mut explorer = match cli.seed {
        Some(seed) => MockExplorer::with_seed(seed).with_latency(
            config.explorer.latency_min_ms,
            config.explorer.latency_max_ms,
        ),
        None => MockExplorer::new(&config.explorer),
    };
    if cli.fast {
        explorer = explorer.with_latency(0, 0);
    }

    match cli.command {
        Commands::Blocks { count } => {
            let blocks = with_spinner(
                "Fetching blocks...",
                explorer.latest_blocks(count.unwrap_or(page_size)),
            )
            .await?;
            println!("{}", cli::blocks_table(&blocks));
        }
        Commands::Block { height } => {
            let details = with_spinner("Fetching block...", explorer.block(height)).await?;
            println!("{}", cli::blocks_table(std::slice::from_ref(&details.block)));
            if details.transactions.is_empty() {
                println!("{}", "No transactions in this block.".yellow());
            } else {
                println!("{}", cli::transactions_table(&details.transactions));
            }
        }
        Commands::Txs {
            count,
            status,
            address,
            kind,
        } => {
            let txs = with_spinner(
                "Fetching transactions...",
                explorer.recent_transactions(count.unwrap_or(page_size)),
            )
            .await?;
            let filter = TxFilter {
                status,
                address,
                kind,
            };
            let shown = filter.apply(&txs);
            if shown.is_empty() {
                println!("{}", "No matching transactions.".yellow());
            } else {
                println!("{}", cli::transactions_table(shown));
            }
        }
        Commands::Tx { hash } => {
            let tx = with_spinner("Fetching transaction...", explorer.transaction(&hash)).await?;
            println!("{}", cli::transaction_detail(&tx));
        }
        Commands::Status => {
            let status = with_spinner("Fetching chain status...", explorer.chain_status()).await?;
            println!("{}", cli::chain_status_table(&status));
        }
    }

    Ok(())
}
