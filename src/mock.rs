//! In-process `ChainApi` for tests and offline runs

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::client::ChainApi;
use crate::config::ServerConfig;
use crate::error::{Result, WalletError};
use crate::ledger::{Ledger, LedgerError};
use crate::wire::{
    check, AccountResponse, BalanceResponse, HealthResponse, NodeStatusResponse,
    TransactionResponse, TransferRequest, TransferResponse,
};

/// Serves the REST contract straight from a [`Ledger`].
///
/// Two switches simulate unhappy backends: `set_offline` turns every call
/// into a transport failure, and `set_indexing(false)` makes `query_tx`
/// answer "not found" for every hash.
#[derive(Debug, Clone)]
pub struct MockChainApi {
    ledger: Arc<Ledger>,
    offline: Arc<AtomicBool>,
    indexing: Arc<AtomicBool>,
}

impl Default for MockChainApi {
    fn default() -> Self {
        Self::new(Arc::new(Ledger::default()))
    }
}

impl MockChainApi {
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self {
            ledger,
            offline: Arc::new(AtomicBool::new(false)),
            indexing: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn with_config(config: &ServerConfig) -> Self {
        Self::new(Arc::new(Ledger::new(config)))
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_indexing(&self, indexing: bool) {
        self.indexing.store(indexing, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(WalletError::Transport("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

fn rejected(err: LedgerError) -> WalletError {
    WalletError::Rejected(err.to_string())
}

#[async_trait]
impl ChainApi for MockChainApi {
    async fn health(&self) -> Result<HealthResponse> {
        self.ensure_online()?;
        Ok(HealthResponse {
            status: "ok".to_string(),
        })
    }

    async fn create_account(&self, name: &str) -> Result<AccountResponse> {
        self.ensure_online()?;
        check(self.ledger.create_account(name).map_err(rejected)?)
    }

    async fn account_balance(&self, address: &str) -> Result<BalanceResponse> {
        self.ensure_online()?;
        check(self.ledger.balance(address).map_err(rejected)?)
    }

    async fn transfer(&self, request: &TransferRequest) -> Result<TransferResponse> {
        self.ensure_online()?;
        check(self.ledger.transfer(request).map_err(rejected)?)
    }

    async fn query_tx(&self, hash: &str) -> Result<TransactionResponse> {
        self.ensure_online()?;
        if !self.indexing.load(Ordering::SeqCst) {
            return Err(rejected(LedgerError::UnknownTx(hash.trim().to_string())));
        }
        check(self.ledger.query_tx(hash).map_err(rejected)?)
    }

    async fn node_status(&self) -> Result<NodeStatusResponse> {
        self.ensure_online()?;
        check(self.ledger.node_status())
    }
}
