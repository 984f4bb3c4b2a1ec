//! Terminal presentation shared by the command-line tools

use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Color as TableColor;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::time::Duration;

use crate::types::{Block, ChainStatus, Transaction, TxStatus, WalletInfo};
use crate::wallet::ConnectionState;

const SHORT_EDGE: usize = 8;

/// `cosmos1ab...ef012345` style abbreviation of long hashes and addresses.
pub fn short(s: &str) -> String {
    if s.len() <= SHORT_EDGE * 2 + 3 || !s.is_ascii() {
        return s.to_string();
    }
    format!("{}...{}", &s[..SHORT_EDGE], &s[s.len() - SHORT_EDGE..])
}

pub fn status_color(status: TxStatus) -> TableColor {
    match status {
        TxStatus::Success => TableColor::Green,
        TxStatus::Pending => TableColor::Yellow,
        TxStatus::Failed => TableColor::Red,
    }
}

pub fn colored_status(status: TxStatus) -> ColoredString {
    let label = status.to_string();
    match status {
        TxStatus::Success => label.green(),
        TxStatus::Pending => label.yellow(),
        TxStatus::Failed => label.red(),
    }
}

pub fn colored_state(state: ConnectionState) -> ColoredString {
    let label = state.to_string();
    match state {
        ConnectionState::Connected => label.green().bold(),
        ConnectionState::Disconnected => label.red(),
        ConnectionState::Connecting | ConnectionState::Sending => label.yellow(),
    }
}

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|t| {
            Cell::new(t)
                .fg(TableColor::Cyan)
                .add_attribute(Attribute::Bold)
        })
        .collect()
}

fn new_table(titles: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(titles));
    table
}

pub fn blocks_table(blocks: &[Block]) -> Table {
    let mut table = new_table(&["Height", "Hash", "Proposer", "Txs", "Gas", "Time"]);
    for block in blocks {
        table.add_row(vec![
            Cell::new(format!("#{}", block.height)).fg(TableColor::White),
            Cell::new(&block.hash).fg(TableColor::Magenta),
            Cell::new(short(&block.proposer)),
            Cell::new(block.tx_count),
            Cell::new(format!("{}/{}", block.gas_used, block.gas_limit)).fg(TableColor::Grey),
            Cell::new(block.timestamp.format("%Y-%m-%d %H:%M:%S")).fg(TableColor::Grey),
        ]);
    }
    table
}

pub fn transactions_table<'a, I>(txs: I) -> Table
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut table = new_table(&["Hash", "Type", "Status", "From", "To", "Amount", "Height"]);
    for tx in txs {
        let height = tx
            .height
            .map(|h| format!("#{}", h))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(short(&tx.hash)).fg(TableColor::Magenta),
            Cell::new(tx.kind),
            Cell::new(tx.status).fg(status_color(tx.status)),
            Cell::new(short(&tx.sender)),
            Cell::new(short(&tx.recipient)),
            Cell::new(format!("{} {}", tx.amount, tx.denom)),
            Cell::new(height).fg(TableColor::Grey),
        ]);
    }
    table
}

/// One transaction as a two-column detail view.
pub fn transaction_detail(tx: &Transaction) -> Table {
    let mut table = new_table(&["Field", "Value"]);
    let optional = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    let rows: Vec<(&str, Cell)> = vec![
        ("Hash", Cell::new(&tx.hash)),
        ("Type", Cell::new(tx.kind)),
        ("Status", Cell::new(tx.status).fg(status_color(tx.status))),
        ("Height", Cell::new(optional(tx.height.map(|h| h.to_string())))),
        ("Time", Cell::new(tx.timestamp.to_rfc3339())),
        ("From", Cell::new(&tx.sender)),
        ("To", Cell::new(&tx.recipient)),
        ("Amount", Cell::new(format!("{} {}", tx.amount, tx.denom))),
        ("Fee", Cell::new(optional(tx.fee.clone()))),
        ("Memo", Cell::new(optional(tx.memo.clone()))),
        (
            "Gas",
            Cell::new(format!(
                "{} / {}",
                optional(tx.gas_used.map(|g| g.to_string())),
                optional(tx.gas_wanted.map(|g| g.to_string()))
            )),
        ),
    ];
    for (field, value) in rows {
        table.add_row(vec![Cell::new(field).add_attribute(Attribute::Bold), value]);
    }
    table
}

pub fn chain_status_table(status: &ChainStatus) -> Table {
    let mut table = new_table(&["Metric", "Value"]);
    table.add_row(vec!["Latest height".to_string(), format!("#{}", status.latest_height)]);
    table.add_row(vec!["Block time".to_string(), format!("{:.1}s", status.block_time_secs)]);
    table.add_row(vec!["Transactions".to_string(), status.tx_count.to_string()]);
    table.add_row(vec![
        "Validators".to_string(),
        format!("{} active / {}", status.active_validators, status.validator_count),
    ]);
    table.add_row(vec!["Bonded tokens".to_string(), status.bonded_tokens.clone()]);
    table.add_row(vec![
        "Inflation".to_string(),
        format!("{:.2}%", status.inflation * 100.0),
    ]);
    table
}

pub fn wallet_table(wallet: &WalletInfo) -> Table {
    let mut table = new_table(&["Field", "Value"]);
    table.add_row(vec![
        Cell::new("Account").add_attribute(Attribute::Bold),
        Cell::new(wallet.account_name.as_deref().unwrap_or("-")),
    ]);
    table.add_row(vec![
        Cell::new("Address").add_attribute(Attribute::Bold),
        Cell::new(&wallet.address),
    ]);
    let balances = if wallet.balances.is_empty() {
        "(none)".to_string()
    } else {
        wallet
            .balances
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    };
    table.add_row(vec![
        Cell::new("Balances").add_attribute(Attribute::Bold),
        Cell::new(balances),
    ]);
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(&wallet.total_balance).fg(TableColor::Green),
    ]);
    table.add_row(vec![
        Cell::new("Available").add_attribute(Attribute::Bold),
        Cell::new(&wallet.available_balance).fg(TableColor::Green),
    ]);
    table
}

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Run `fut` behind a spinner, clearing it when the future settles.
pub async fn with_spinner<F, T>(message: &str, fut: F) -> T
where
    F: Future<Output = T>,
{
    let bar = spinner(message);
    let out = fut.await;
    bar.finish_and_clear();
    out
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}
