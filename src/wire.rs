//! Request and response envelopes of the wallet REST contract
//!
//! Every response except `/health` carries a `success` flag and an optional
//! `error` string. A `success: false` envelope is a recoverable rejection,
//! distinct from a transport failure; [`check`] turns it into
//! [`WalletError::Rejected`] so both reach the caller through one channel.

use crate::error::{Result, WalletError};
use crate::types::{Coin, TxStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fallback message when the backend says `success: false` without saying why.
pub const UNSPECIFIED_FAILURE: &str = "backend reported failure";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountResponse {
    pub success: bool,
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub next_key: Option<String>,
    #[serde(default)]
    pub total: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceData {
    #[serde(default)]
    pub balances: Vec<Coin>,
    #[serde(default)]
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub success: bool,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub balance: BalanceData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `from` is the backend's account name, not an address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from: String,
    pub to: String,
    pub amount: String,
    pub denom: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferResponse {
    pub success: bool,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub tx_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub success: bool,
    #[serde(default)]
    pub tx_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransactionResponse {
    /// Outcome of the queried transaction as far as the backend knows.
    ///
    /// A numeric `code` of 0 means the transaction executed; any other code
    /// means it was included but failed. Without a code, a successful
    /// envelope with data counts as executed.
    pub fn outcome(&self) -> Option<TxStatus> {
        if !self.success {
            return None;
        }
        let data = self.tx_data.as_ref()?;
        match data.get("code").and_then(Value::as_u64) {
            Some(0) => Some(TxStatus::Success),
            Some(_) => Some(TxStatus::Failed),
            None if data.is_null() => None,
            None => Some(TxStatus::Success),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeStatusResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NodeStatusResponse {
    /// `sync_info.latest_block_height`, when the status carries one.
    pub fn latest_height(&self) -> Option<u64> {
        let value = self.status.as_ref()?.get("sync_info")?.get("latest_block_height")?;
        match value {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }
}

/// Minimal envelope used to read `success`/`error` from any response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Common view over the `success`/`error` pair.
pub trait Enveloped {
    fn success(&self) -> bool;
    fn error(&self) -> Option<&str>;
}

macro_rules! impl_enveloped {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Enveloped for $ty {
                fn success(&self) -> bool {
                    self.success
                }

                fn error(&self) -> Option<&str> {
                    self.error.as_deref()
                }
            }
        )*
    };
}

impl_enveloped!(
    AccountResponse,
    BalanceResponse,
    TransferResponse,
    TransactionResponse,
    NodeStatusResponse,
    Envelope,
);

/// Pass a successful envelope through; turn `success: false` into a rejection
/// carrying the backend's message verbatim.
pub fn check<T: Enveloped>(response: T) -> Result<T> {
    if response.success() {
        Ok(response)
    } else {
        let message = response
            .error()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(UNSPECIFIED_FAILURE)
            .to_string();
        Err(WalletError::Rejected(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_envelope_parses_with_missing_fields() {
        let body = r#"{"success": false, "error": "account not found"}"#;
        let resp: BalanceResponse = serde_json::from_str(body).unwrap();
        assert!(!resp.success);
        assert!(resp.balance.balances.is_empty());

        match check(resp) {
            Err(WalletError::Rejected(msg)) => assert_eq!(msg, "account not found"),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_failure_without_message_gets_fallback() {
        let resp = TransferResponse {
            success: false,
            ..Default::default()
        };
        match check(resp) {
            Err(WalletError::Rejected(msg)) => assert_eq!(msg, UNSPECIFIED_FAILURE),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_balance_envelope_shape() {
        let body = json!({
            "success": true,
            "address": "cosmos1abc",
            "balance": {
                "balances": [{"denom": "stake", "amount": "1000"}],
                "pagination": {"next_key": null, "total": "1"}
            }
        });
        let resp: BalanceResponse = serde_json::from_value(body).unwrap();
        let resp = check(resp).unwrap();
        assert_eq!(resp.balance.balances, vec![Coin::new("1000", "stake")]);
        assert_eq!(resp.balance.pagination.total, "1");
    }

    #[test]
    fn test_tx_outcome_from_code() {
        let ok = TransactionResponse {
            success: true,
            tx_hash: "AB".to_string(),
            tx_data: Some(json!({"code": 0})),
            error: None,
        };
        assert_eq!(ok.outcome(), Some(TxStatus::Success));

        let failed = TransactionResponse {
            tx_data: Some(json!({"code": 5, "raw_log": "out of gas"})),
            ..ok.clone()
        };
        assert_eq!(failed.outcome(), Some(TxStatus::Failed));

        let no_code = TransactionResponse {
            tx_data: Some(json!({"txhash": "AB"})),
            ..ok.clone()
        };
        assert_eq!(no_code.outcome(), Some(TxStatus::Success));

        let missing = TransactionResponse {
            tx_data: None,
            ..ok
        };
        assert_eq!(missing.outcome(), None);
    }

    #[test]
    fn test_latest_height_accepts_string_or_number() {
        let as_string = NodeStatusResponse {
            success: true,
            status: Some(json!({"sync_info": {"latest_block_height": "42"}})),
            error: None,
        };
        assert_eq!(as_string.latest_height(), Some(42));

        let as_number = NodeStatusResponse {
            success: true,
            status: Some(json!({"sync_info": {"latest_block_height": 7}})),
            error: None,
        };
        assert_eq!(as_number.latest_height(), Some(7));
    }
}
