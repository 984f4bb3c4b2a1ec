//! Display records shared by the wallet and the explorer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::WalletError;

/// A token amount in one denomination, as the backend reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

impl Coin {
    pub fn new(amount: impl Into<String>, denom: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.denom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Success,
    Failed,
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            TxStatus::Pending => "pending",
            TxStatus::Success => "success",
            TxStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

impl FromStr for TxStatus {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(TxStatus::Pending),
            "success" => Ok(TxStatus::Success),
            "failed" => Ok(TxStatus::Failed),
            other => Err(WalletError::InvalidInput(format!(
                "unknown transaction status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Transfer,
    Delegate,
    Send,
    Receive,
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            TxKind::Transfer => "transfer",
            TxKind::Delegate => "delegate",
            TxKind::Send => "send",
            TxKind::Receive => "receive",
        };
        f.write_str(s)
    }
}

impl FromStr for TxKind {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "transfer" => Ok(TxKind::Transfer),
            "delegate" => Ok(TxKind::Delegate),
            "send" => Ok(TxKind::Send),
            "receive" => Ok(TxKind::Receive),
            other => Err(WalletError::InvalidInput(format!(
                "unknown transaction type '{}'",
                other
            ))),
        }
    }
}

/// A transaction as shown in lists and detail views.
///
/// `height` is informational only; nothing checks it against a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: String,
    #[serde(default)]
    pub height: Option<u64>,
    #[serde(rename = "type")]
    pub kind: TxKind,
    pub status: TxStatus,
    pub timestamp: DateTime<Utc>,
    pub sender: String,
    pub recipient: String,
    pub amount: String,
    pub denom: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_wanted: Option<u64>,
}

impl Transaction {
    pub fn involves(&self, address: &str) -> bool {
        self.sender == address || self.recipient == address
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub height: u64,
    pub hash: String,
    /// Generated on its own; never compared with the parent's hash.
    pub previous_hash: String,
    pub timestamp: DateTime<Utc>,
    pub proposer: String,
    pub tx_count: u32,
    pub gas_used: u64,
    pub gas_limit: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDetails {
    #[serde(flatten)]
    pub block: Block,
    pub transactions: Vec<Transaction>,
}

/// Flat snapshot of chain-wide numbers. Regenerated from scratch on each read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainStatus {
    pub latest_height: u64,
    pub block_time_secs: f64,
    pub tx_count: u64,
    pub validator_count: u32,
    pub active_validators: u32,
    pub bonded_tokens: String,
    pub inflation: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub validator: String,
    pub amount: String,
    pub denom: String,
}

/// Read-model of a connected wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletInfo {
    pub address: String,
    pub account_name: Option<String>,
    pub balances: Vec<Coin>,
    pub transactions: Vec<Transaction>,
    pub delegations: Vec<Delegation>,
    /// Sum of every balance amount, six decimal places.
    pub total_balance: String,
    /// Same as `total_balance`; delegated or locked funds are not subtracted.
    pub available_balance: String,
}

/// A locally known account: the name the backend keys transfers by, and its
/// address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    pub address: String,
    /// RFC3339 timestamp of when this client first learned the account
    #[serde(default)]
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_type_field_name() {
        let tx = Transaction {
            hash: "0xabc".to_string(),
            height: Some(10),
            kind: TxKind::Delegate,
            status: TxStatus::Failed,
            timestamp: Utc::now(),
            sender: "cosmos1a".to_string(),
            recipient: "cosmos1b".to_string(),
            amount: "5".to_string(),
            denom: "udemo".to_string(),
            fee: None,
            memo: None,
            gas_used: None,
            gas_wanted: None,
        };
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "delegate");
        assert_eq!(json["status"], "failed");
        assert!(json.get("memo").is_none());
    }

    #[test]
    fn test_status_parsing_is_case_insensitive() {
        assert_eq!("Success".parse::<TxStatus>().unwrap(), TxStatus::Success);
        assert_eq!(" PENDING ".parse::<TxStatus>().unwrap(), TxStatus::Pending);
        assert!("done".parse::<TxStatus>().is_err());
    }

    #[test]
    fn test_block_details_flattens_block() {
        let details = BlockDetails {
            block: Block {
                height: 7,
                hash: "0x01".to_string(),
                previous_hash: "0x00".to_string(),
                timestamp: Utc::now(),
                proposer: "cosmos1validator".to_string(),
                tx_count: 0,
                gas_used: 0,
                gas_limit: 200_000,
            },
            transactions: Vec::new(),
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["height"], 7);
        assert!(json["transactions"].is_array());
    }
}
