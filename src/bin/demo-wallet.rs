#![forbid(unsafe_code)]
//! Wallet front end for the Cosmos Demo REST backend

use clap::{Parser, Subcommand};
use colored::*;
use cosmos_demo::cli::{self, with_spinner};
use cosmos_demo::config::{load_config, Config, DEFAULT_CONFIG_FILE};
use cosmos_demo::types::{TxKind, TxStatus};
use cosmos_demo::{
    ChainApi, HttpChainApi, SqliteStore, TxFilter, WalletController, WalletError,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

type Wallet = WalletController<HttpChainApi, SqliteStore>;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Backend base URL (overrides the configuration)
    #[arg(long)]
    api_url: Option<String>,
    /// Key-value store path (overrides the configuration)
    #[arg(long)]
    store: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Creates an account on the backend and remembers it
    Create {
        /// Account name
        name: String,
    },
    /// Lists locally known accounts
    Accounts,
    /// Connects a wallet (remembered address, or the first account)
    Connect {
        /// Address to connect
        address: Option<String>,
    },
    /// Shows balances of the connected wallet
    Balance,
    /// Sends tokens from the connected wallet
    Send {
        /// Recipient address
        to: String,
        /// Amount to send
        amount: String,
        #[arg(long)]
        denom: Option<String>,
        #[arg(long)]
        memo: Option<String>,
    },
    /// Shows this session's transactions
    History {
        #[arg(long)]
        status: Option<TxStatus>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long = "type")]
        kind: Option<TxKind>,
    },
    /// Re-checks pending transactions
    Reconcile,
    /// Looks up a transaction on the backend
    Tx {
        hash: String,
    },
    /// Disconnects the wallet and forgets the session
    Disconnect,
    /// Shows backend health and node status
    Status,
    /// Interactive session keeping history between commands
    Shell,
}

#[derive(Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(tracing::Level::WARN)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let store = SqliteStore::open(&config.storage.resolved_path())?;
    let api = HttpChainApi::new(&config.api)?;
    let mut wallet = WalletController::new(api, store)?.with_default_denom(&config.api.default_denom);

    if matches!(cli.command, Commands::Shell) {
        return run_shell(&mut wallet).await;
    }

    // One-shot commands pick up where the last session left off.
    if !matches!(
        cli.command,
        Commands::Create { .. } | Commands::Accounts | Commands::Connect { .. } | Commands::Status
    ) {
        if let Err(e) = with_spinner("Restoring session...", wallet.resume_session()).await {
            cli::print_error(&format!("Could not restore session: {}", e));
        }
    }

    if let Err(e) = run(&mut wallet, cli.command).await {
        cli::print_error(&e.to_string());
        std::process::exit(1);
    }
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<Config, WalletError> {
    let mut config = load_config(&cli.config)?;
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    if let Some(store) = &cli.store {
        config.storage.path = store.display().to_string();
    }
    cosmos_demo::config::validate(&config)?;
    Ok(config)
}

async fn run(wallet: &mut Wallet, command: Commands) -> Result<(), WalletError> {
    match command {
        Commands::Create { name } => {
            let account =
                with_spinner("Creating account...", wallet.create_account(&name)).await?;
            cli::print_success(&format!(
                "Account {} created: {}",
                account.name.bright_yellow(),
                account.address.cyan()
            ));
        }
        Commands::Accounts => {
            let accounts = wallet.accounts().list();
            if accounts.is_empty() {
                println!("{}", "No accounts yet. Run 'create <name>' first.".yellow());
            }
            for account in accounts {
                println!("{:<20} {}", account.name.bright_yellow(), account.address);
            }
        }
        Commands::Connect { address } => {
            let info = with_spinner(
                "Connecting wallet...",
                wallet.connect_wallet(address.as_deref()),
            )
            .await?;
            cli::print_success("Wallet connected");
            println!("{}", cli::wallet_table(&info));
        }
        Commands::Balance => {
            let info = with_spinner("Fetching balances...", wallet.refresh()).await?;
            println!("{}", cli::wallet_table(&info));
        }
        Commands::Send {
            to,
            amount,
            denom,
            memo,
        } => {
            let tx = with_spinner(
                "Sending transaction...",
                wallet.send_transaction(&to, &amount, denom.as_deref(), memo.as_deref()),
            )
            .await?;
            cli::print_success(&format!(
                "Transaction {} is {}",
                tx.hash.cyan(),
                cli::colored_status(tx.status)
            ));
            if let Some(warning) = wallet.last_error() {
                println!("{} {}", "!".yellow().bold(), warning.yellow());
            }
        }
        Commands::History {
            status,
            address,
            kind,
        } => {
            let filter = TxFilter {
                status,
                address,
                kind,
            };
            let txs = wallet.filtered_transactions(&filter);
            if txs.is_empty() {
                println!("{}", "No transactions in this session.".yellow());
            } else {
                println!("{}", cli::transactions_table(txs));
            }
        }
        Commands::Reconcile => {
            let settled = with_spinner("Checking pending...", wallet.reconcile_pending()).await;
            println!("{} transaction(s) settled", settled);
        }
        Commands::Tx { hash } => {
            let response = with_spinner("Querying...", wallet.api().query_tx(&hash)).await?;
            let outcome = response
                .outcome()
                .map(|s| cli::colored_status(s).to_string())
                .unwrap_or_else(|| "unknown".to_string());
            println!("{} {}", response.tx_hash.cyan(), outcome);
            if let Some(data) = response.tx_data {
                println!("{}", serde_json::to_string_pretty(&data)?);
            }
        }
        Commands::Disconnect => {
            wallet.disconnect_wallet()?;
            cli::print_success("Wallet disconnected");
        }
        Commands::Status => {
            let health = with_spinner("Checking backend...", wallet.api().health()).await?;
            let status = wallet.api().node_status().await?;
            println!("Backend: {}", health.status.green());
            match status.latest_height() {
                Some(height) => println!("Latest height: #{}", height),
                None => println!("Latest height: unknown"),
            }
            println!("Wallet: {}", cli::colored_state(wallet.state()));
        }
        Commands::Shell => {
            println!("{}", "Already in a shell.".yellow());
        }
    }
    Ok(())
}

async fn run_shell(wallet: &mut Wallet) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "Cosmos Demo wallet shell. Type 'help' or 'exit'.".bright_cyan());
    if let Ok(Some(info)) = wallet.resume_session().await {
        println!("Resumed wallet {}", info.address.cyan());
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{} ", format!("[{}]>", wallet.state()).bright_magenta());
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.first().copied() {
            None => continue,
            Some("exit") | Some("quit") => break,
            _ => {}
        }

        match ShellLine::try_parse_from(words) {
            Ok(parsed) => {
                if let Err(e) = run(wallet, parsed.command).await {
                    cli::print_error(&e.to_string());
                }
            }
            Err(e) => {
                let _ = e.print();
            }
        }
    }
    Ok(())
}
