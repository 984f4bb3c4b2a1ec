//! Transaction list filtering

use crate::types::{Transaction, TxKind, TxStatus};

/// Criteria for narrowing a transaction list. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxFilter {
    pub status: Option<TxStatus>,
    /// Case-insensitive substring of sender or recipient
    pub address: Option<String>,
    pub kind: Option<TxKind>,
}

impl TxFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: TxStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        let address = address.into();
        self.address = if address.trim().is_empty() {
            None
        } else {
            Some(address)
        };
        self
    }

    pub fn kind(mut self, kind: TxKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.address.is_none() && self.kind.is_none()
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        if self.status.is_some_and(|s| s != tx.status) {
            return false;
        }
        if self.kind.is_some_and(|k| k != tx.kind) {
            return false;
        }
        if let Some(needle) = &self.address {
            let needle = needle.trim().to_lowercase();
            if !tx.sender.to_lowercase().contains(&needle)
                && !tx.recipient.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }

    /// Matching transactions in source order.
    pub fn apply<'a>(&self, txs: &'a [Transaction]) -> Vec<&'a Transaction> {
        txs.iter().filter(|tx| self.matches(tx)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn tx(hash: &str, kind: TxKind, status: TxStatus, sender: &str, recipient: &str) -> Transaction {
        Transaction {
            hash: hash.to_string(),
            height: None,
            kind,
            status,
            timestamp: Utc::now(),
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            amount: "1".to_string(),
            denom: "udemo".to_string(),
            fee: None,
            memo: None,
            gas_used: None,
            gas_wanted: None,
        }
    }

    fn sample() -> Vec<Transaction> {
        vec![
            tx("a", TxKind::Transfer, TxStatus::Success, "cosmos1Alice", "cosmos1bob"),
            tx("b", TxKind::Delegate, TxStatus::Failed, "cosmos1carol", "cosmos1validator"),
            tx("c", TxKind::Send, TxStatus::Pending, "cosmos1bob", "cosmos1alice"),
            tx("d", TxKind::Transfer, TxStatus::Success, "cosmos1dave", "cosmos1erin"),
        ]
    }

    fn hashes(txs: Vec<&Transaction>) -> Vec<&str> {
        txs.into_iter().map(|t| t.hash.as_str()).collect()
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let txs = sample();
        let filter = TxFilter::new();
        assert!(filter.is_empty());
        assert_eq!(hashes(filter.apply(&txs)), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_address_substring_is_case_insensitive() {
        let txs = sample();
        let filter = TxFilter::new().address("ALICE");
        assert_eq!(hashes(filter.apply(&txs)), vec!["a", "c"]);
    }

    #[test]
    fn test_criteria_combine() {
        let txs = sample();
        let filter = TxFilter::new().status(TxStatus::Success).kind(TxKind::Transfer);
        assert_eq!(hashes(filter.apply(&txs)), vec!["a", "d"]);

        let filter = filter.address("dave");
        assert_eq!(hashes(filter.apply(&txs)), vec!["d"]);
    }

    #[test]
    fn test_blank_address_is_ignored() {
        let txs = sample();
        let filter = TxFilter::new().address("  ");
        assert!(filter.address.is_none());
        assert_eq!(filter.apply(&txs).len(), 4);
    }
}
