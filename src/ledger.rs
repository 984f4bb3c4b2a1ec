//! In-memory account book behind the stub backend and the mock API
//!
//! Accounts are keyed by name, balances by address. Transfers debit the
//! sender's account and credit whatever address they name, producing a record
//! that `query_tx` can later report. Nothing here is durable.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::info;

use crate::config::ServerConfig;
use crate::types::Coin;
use crate::wire::{
    AccountResponse, BalanceData, BalanceResponse, NodeStatusResponse, Pagination,
    TransactionResponse, TransferRequest, TransferResponse,
};

/// Address prefix of every generated account.
pub const ADDRESS_PREFIX: &str = "cosmos1";
const ADDRESS_BODY_LEN: usize = 38;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("account name cannot be empty")]
    EmptyName,

    #[error("key {0} already exists")]
    DuplicateAccount(String),

    #[error("key {0} not found")]
    UnknownAccount(String),

    #[error("address cannot be empty")]
    EmptyAddress,

    #[error("recipient address cannot be empty")]
    EmptyRecipient,

    #[error("invalid amount '{0}': must be a positive integer")]
    InvalidAmount(String),

    #[error("denom cannot be empty")]
    EmptyDenom,

    #[error("insufficient funds: {have}{denom} < {want}{denom}")]
    InsufficientFunds { have: u128, want: u128, denom: String },

    #[error("tx ({0}) not found")]
    UnknownTx(String),

    #[error("balance overflow")]
    Overflow,
}

impl LedgerError {
    /// Whether the error means "no such thing" rather than "bad request".
    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::UnknownAccount(_) | LedgerError::UnknownTx(_))
    }
}

/// A transfer the ledger has executed.
#[derive(Debug, Clone, PartialEq)]
pub struct TxRecord {
    pub hash: String,
    pub height: u64,
    pub timestamp: DateTime<Utc>,
    pub from: String,
    pub to: String,
    pub amount: u128,
    pub denom: String,
}

#[derive(Debug, Default)]
struct LedgerState {
    accounts: HashMap<String, String>,
    balances: HashMap<String, BTreeMap<String, u128>>,
    txs: HashMap<String, TxRecord>,
    height: u64,
    sequence: u64,
}

#[derive(Debug)]
pub struct Ledger {
    state: RwLock<LedgerState>,
    chain_id: String,
    denom: String,
    initial_balance: u128,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(&ServerConfig::default())
    }
}

impl Ledger {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            state: RwLock::new(LedgerState {
                height: 1,
                ..LedgerState::default()
            }),
            chain_id: config.chain_id.clone(),
            denom: config.denom.clone(),
            initial_balance: config.initial_balance,
        }
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn height(&self) -> u64 {
        self.state.read().height
    }

    pub fn address_of(&self, name: &str) -> Option<String> {
        self.state.read().accounts.get(name).cloned()
    }

    pub fn account_count(&self) -> usize {
        self.state.read().accounts.len()
    }

    pub fn tx(&self, hash: &str) -> Option<TxRecord> {
        self.state.read().txs.get(&normalize_hash(hash)).cloned()
    }

    /// Register `name` and fund it with the configured initial balance.
    pub fn create_account(&self, name: &str) -> Result<AccountResponse, LedgerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::EmptyName);
        }

        let mut state = self.state.write();
        if state.accounts.contains_key(name) {
            return Err(LedgerError::DuplicateAccount(name.to_string()));
        }

        state.sequence += 1;
        let address = derive_address(name, state.sequence);
        state.accounts.insert(name.to_string(), address.clone());
        if self.initial_balance > 0 {
            *state
                .balances
                .entry(address.clone())
                .or_default()
                .entry(self.denom.clone())
                .or_insert(0) += self.initial_balance;
        }
        drop(state);

        info!(name, address = %address, "account created");
        Ok(AccountResponse {
            success: true,
            account_name: name.to_string(),
            address: address.clone(),
            output: Some(format!("- name: {}\n  address: {}", name, address)),
            error: None,
        })
    }

    /// Balances held by `address`. Unknown addresses simply hold nothing.
    pub fn balance(&self, address: &str) -> Result<BalanceResponse, LedgerError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(LedgerError::EmptyAddress);
        }

        let state = self.state.read();
        let balances: Vec<Coin> = state
            .balances
            .get(address)
            .map(|coins| {
                coins
                    .iter()
                    .filter(|(_, amount)| **amount > 0)
                    .map(|(denom, amount)| Coin::new(amount.to_string(), denom.clone()))
                    .collect()
            })
            .unwrap_or_default();

        Ok(BalanceResponse {
            success: true,
            address: address.to_string(),
            balance: BalanceData {
                pagination: Pagination {
                    next_key: None,
                    total: balances.len().to_string(),
                },
                balances,
            },
            error: None,
        })
    }

    /// Move funds from the named account to `request.to`.
    pub fn transfer(&self, request: &TransferRequest) -> Result<TransferResponse, LedgerError> {
        let to = request.to.trim();
        if to.is_empty() {
            return Err(LedgerError::EmptyRecipient);
        }
        let denom = request.denom.trim();
        if denom.is_empty() {
            return Err(LedgerError::EmptyDenom);
        }
        let amount = parse_integer_amount(&request.amount)?;

        let mut state = self.state.write();
        let from_address = state
            .accounts
            .get(request.from.trim())
            .cloned()
            .ok_or_else(|| LedgerError::UnknownAccount(request.from.trim().to_string()))?;

        let have = state
            .balances
            .get(&from_address)
            .and_then(|coins| coins.get(denom))
            .copied()
            .unwrap_or(0);
        if have < amount {
            return Err(LedgerError::InsufficientFunds {
                have,
                want: amount,
                denom: denom.to_string(),
            });
        }

        let credited = state
            .balances
            .get(to)
            .and_then(|coins| coins.get(denom))
            .copied()
            .unwrap_or(0);
        // Self-transfers leave the balance where it was.
        if to != from_address {
            credited.checked_add(amount).ok_or(LedgerError::Overflow)?;
        }

        let from_coins = state.balances.entry(from_address.clone()).or_default();
        from_coins.insert(denom.to_string(), have - amount);
        let to_coins = state.balances.entry(to.to_string()).or_default();
        let current = to_coins.get(denom).copied().unwrap_or(0);
        to_coins.insert(denom.to_string(), current + amount);

        state.sequence += 1;
        state.height += 1;
        let record = TxRecord {
            hash: derive_tx_hash(&from_address, to, amount, denom, state.sequence),
            height: state.height,
            timestamp: Utc::now(),
            from: from_address.clone(),
            to: to.to_string(),
            amount,
            denom: denom.to_string(),
        };
        let hash = record.hash.clone();
        state.txs.insert(hash.clone(), record);
        drop(state);

        info!(from = %from_address, to, amount = %amount, denom, hash = %hash, "transfer executed");
        Ok(TransferResponse {
            success: true,
            from: request.from.trim().to_string(),
            to: to.to_string(),
            amount: format!("{}{}", amount, denom),
            tx_hash: hash.clone(),
            output: Some(format!("txhash: {}", hash)),
            error: None,
        })
    }

    /// Report an executed transfer. Hashes match case-insensitively.
    pub fn query_tx(&self, hash: &str) -> Result<TransactionResponse, LedgerError> {
        let record = self
            .tx(hash)
            .ok_or_else(|| LedgerError::UnknownTx(hash.trim().to_string()))?;

        Ok(TransactionResponse {
            success: true,
            tx_hash: record.hash.clone(),
            tx_data: Some(json!({
                "txhash": record.hash,
                "height": record.height.to_string(),
                "code": 0,
                "timestamp": record.timestamp.to_rfc3339(),
                "from": record.from,
                "to": record.to,
                "amount": record.amount.to_string(),
                "denom": record.denom,
            })),
            error: None,
        })
    }

    pub fn node_status(&self) -> NodeStatusResponse {
        let height = self.height();
        NodeStatusResponse {
            success: true,
            status: Some(json!({
                "node_info": {
                    "network": self.chain_id,
                    "moniker": "demo-stub",
                },
                "sync_info": {
                    "latest_block_height": height.to_string(),
                    "catching_up": false,
                },
            })),
            error: None,
        }
    }
}

fn normalize_hash(hash: &str) -> String {
    hash.trim().to_uppercase()
}

fn parse_integer_amount(raw: &str) -> Result<u128, LedgerError> {
    let trimmed = raw.trim();
    match trimmed.parse::<u128>() {
        Ok(amount) if amount > 0 => Ok(amount),
        _ => Err(LedgerError::InvalidAmount(trimmed.to_string())),
    }
}

/// `cosmos1` followed by 38 hex digits of `sha256(name ‖ sequence)`.
pub fn derive_address(name: &str, sequence: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(sequence.to_be_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{}{}", ADDRESS_PREFIX, &digest[..ADDRESS_BODY_LEN])
}

fn derive_tx_hash(from: &str, to: &str, amount: u128, denom: &str, sequence: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(from.as_bytes());
    hasher.update(to.as_bytes());
    hasher.update(amount.to_be_bytes());
    hasher.update(denom.as_bytes());
    hasher.update(sequence.to_be_bytes());
    hex::encode_upper(hasher.finalize())
}
