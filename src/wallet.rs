//! Wallet session controller
//!
//! [`WalletController`] is the single owner of wallet state: the account
//! book, the connection state, the loaded [`WalletInfo`] and the last error
//! message. Every operation clears the error when it starts and, on failure,
//! records the failure's message there before returning it, so front ends can
//! either match on the returned [`WalletError`] or just show
//! [`last_error`](WalletController::last_error).
//!
//! Sends are recorded locally as `pending` and later resolved to `success` or
//! `failed` by querying the backend for the transaction hash.

use chrono::Utc;
use serde_json::Value;
use std::fmt;
use tracing::{debug, info, warn};

use crate::accounts::AccountBook;
use crate::amount::{parse_positive_amount, total_balance};
use crate::client::ChainApi;
use crate::error::{Result, WalletError};
use crate::filter::TxFilter;
use crate::storage::{KeyValueStore, LAST_CONNECTED_ADDRESS, WALLET_CONNECTED};
use crate::types::{Account, Transaction, TxKind, TxStatus, WalletInfo};
use crate::wire::TransferRequest;

/// Default denomination for sends when the caller does not name one.
pub const DEFAULT_DENOM: &str = "stake";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Sending,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Sending => "sending",
        };
        f.write_str(s)
    }
}

pub struct WalletController<A: ChainApi, S: KeyValueStore> {
    api: A,
    store: S,
    accounts: AccountBook,
    state: ConnectionState,
    wallet: Option<WalletInfo>,
    last_error: Option<String>,
    default_denom: String,
}

impl<A: ChainApi, S: KeyValueStore> WalletController<A, S> {
    /// Build a controller, loading the persisted account book from `store`.
    pub fn new(api: A, store: S) -> Result<Self> {
        let accounts = AccountBook::load(&store)?;
        debug!(accounts = accounts.len(), "loaded account book");
        Ok(Self {
            api,
            store,
            accounts,
            state: ConnectionState::Disconnected,
            wallet: None,
            last_error: None,
            default_denom: DEFAULT_DENOM.to_string(),
        })
    }

    pub fn with_default_denom(mut self, denom: impl Into<String>) -> Self {
        self.default_denom = denom.into();
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn accounts(&self) -> &AccountBook {
        &self.accounts
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn wallet(&self) -> Option<&WalletInfo> {
        self.wallet.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.wallet.is_some()
            && matches!(
                self.state,
                ConnectionState::Connected | ConnectionState::Sending
            )
    }

    /// State to fall back to once an operation finishes.
    fn idle_state(&self) -> ConnectionState {
        if self.wallet.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    fn fail<T>(&mut self, operation: &str, err: WalletError) -> Result<T> {
        warn!(operation, kind = ?err.kind(), error = %err, "wallet operation failed");
        self.last_error = Some(err.to_string());
        self.state = self.idle_state();
        Err(err)
    }

    /// Register `name` with the backend and remember the returned address.
    pub async fn create_account(&mut self, name: &str) -> Result<Account> {
        self.last_error = None;
        let requested = name.trim();
        if requested.is_empty() {
            return self.fail(
                "create_account",
                WalletError::InvalidInput("account name cannot be empty".to_string()),
            );
        }

        let response = match self.api.create_account(requested).await {
            Ok(r) => r,
            Err(e) => return self.fail("create_account", e),
        };
        if response.address.trim().is_empty() {
            return self.fail(
                "create_account",
                WalletError::Rejected("backend returned no address".to_string()),
            );
        }

        let name = if response.account_name.trim().is_empty() {
            requested
        } else {
            response.account_name.trim()
        };
        let account = match self.accounts.add_and_save(name, &response.address, &self.store) {
            Ok(a) => a,
            Err(e) => return self.fail("create_account", e),
        };

        info!(name = %account.name, address = %account.address, "account created");
        Ok(account)
    }

    /// Load balances for `address`, or the remembered address, or the first
    /// known account.
    pub async fn connect_wallet(&mut self, address: Option<&str>) -> Result<WalletInfo> {
        self.last_error = None;
        let address = match self.resolve_address(address) {
            Ok(a) => a,
            Err(e) => return self.fail("connect_wallet", e),
        };

        self.state = ConnectionState::Connecting;
        if let Err(e) = self.load_wallet(&address).await {
            return self.fail("connect_wallet", e);
        }
        if let Err(e) = self.persist_session(&address) {
            return self.fail("connect_wallet", e);
        }

        self.state = ConnectionState::Connected;
        info!(address = %address, "wallet connected");
        self.wallet.clone().ok_or(WalletError::NotConnected)
    }

    /// Reconnect when the store says a wallet was connected last time.
    pub async fn resume_session(&mut self) -> Result<Option<WalletInfo>> {
        let flag = match self.store.get(WALLET_CONNECTED) {
            Ok(flag) => flag,
            Err(e) => return self.fail("resume_session", e),
        };
        match flag {
            Some(flag) if flag == "true" => self.connect_wallet(None).await.map(Some),
            _ => Ok(None),
        }
    }

    /// Re-read balances for the connected wallet.
    pub async fn refresh(&mut self) -> Result<WalletInfo> {
        let Some(address) = self.wallet.as_ref().map(|w| w.address.clone()) else {
            self.last_error = None;
            return self.fail("refresh", WalletError::NotConnected);
        };
        self.connect_wallet(Some(&address)).await
    }

    fn resolve_address(&self, requested: Option<&str>) -> Result<String> {
        if let Some(address) = requested.map(str::trim).filter(|a| !a.is_empty()) {
            return Ok(address.to_string());
        }
        if let Some(address) = self
            .store
            .get(LAST_CONNECTED_ADDRESS)?
            .filter(|a| !a.trim().is_empty())
        {
            return Ok(address);
        }
        self.accounts
            .first()
            .map(|a| a.address)
            .ok_or(WalletError::NoAccount)
    }

    async fn load_wallet(&mut self, address: &str) -> Result<()> {
        let response = self.api.account_balance(address).await?;
        let balances = response.balance.balances;
        let total = total_balance(&balances)?;

        // History for the same address survives a reload.
        let transactions = match self.wallet.take() {
            Some(previous) if previous.address == address => previous.transactions,
            _ => Vec::new(),
        };

        self.wallet = Some(WalletInfo {
            address: address.to_string(),
            account_name: self.accounts.get_by_address(address).map(|a| a.name),
            balances,
            transactions,
            delegations: Vec::new(),
            total_balance: total.clone(),
            available_balance: total,
        });
        Ok(())
    }

    fn persist_session(&self, address: &str) -> Result<()> {
        self.store.set(LAST_CONNECTED_ADDRESS, address)?;
        self.store.set(WALLET_CONNECTED, "true")
    }

    /// Send `amount` of `denom` (or the default denom) to `recipient`.
    ///
    /// The returned record is the wallet's view of the transfer after one
    /// reconciliation attempt: `success` or `failed` when the backend already
    /// knows the hash, `pending` otherwise.
    pub async fn send_transaction(
        &mut self,
        recipient: &str,
        amount: &str,
        denom: Option<&str>,
        memo: Option<&str>,
    ) -> Result<Transaction> {
        self.last_error = None;
        let Some(sender) = self
            .wallet
            .as_ref()
            .filter(|_| self.state == ConnectionState::Connected)
            .map(|w| w.address.clone())
        else {
            return self.fail("send_transaction", WalletError::NotConnected);
        };

        let recipient = recipient.trim();
        if recipient.is_empty() {
            return self.fail(
                "send_transaction",
                WalletError::InvalidInput("recipient address cannot be empty".to_string()),
            );
        }
        if let Err(e) = parse_positive_amount(amount) {
            return self.fail("send_transaction", e);
        }
        let Some(account) = self.accounts.get_by_address(&sender) else {
            return self.fail(
                "send_transaction",
                WalletError::NotFound(format!("no account name known for {}", sender)),
            );
        };

        let amount = amount.trim().to_string();
        let denom = denom
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(self.default_denom.as_str())
            .to_string();
        let request = TransferRequest {
            from: account.name.clone(),
            to: recipient.to_string(),
            amount: amount.clone(),
            denom: denom.clone(),
        };

        self.state = ConnectionState::Sending;
        let response = match self.api.transfer(&request).await {
            Ok(r) => r,
            Err(e) => return self.fail("send_transaction", e),
        };
        info!(from = %account.name, to = recipient, amount = %amount, denom = %denom, hash = %response.tx_hash, "transfer submitted");

        // The transfer went through; a failed balance reload does not undo it.
        if let Err(e) = self.load_wallet(&sender).await {
            warn!(error = %e, "balance refresh after send failed");
            self.last_error = Some(e.to_string());
        }

        let record = Transaction {
            hash: response.tx_hash.clone(),
            height: None,
            kind: TxKind::Send,
            status: TxStatus::Pending,
            timestamp: Utc::now(),
            sender: sender.clone(),
            recipient: recipient.to_string(),
            amount,
            denom,
            fee: None,
            memo: memo
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string),
            gas_used: None,
            gas_wanted: None,
        };
        if let Some(wallet) = self.wallet.as_mut() {
            wallet.transactions.insert(0, record.clone());
        }
        self.state = ConnectionState::Connected;

        self.reconcile_pending().await;
        Ok(self
            .wallet
            .as_ref()
            .and_then(|w| w.transactions.iter().find(|t| t.hash == record.hash))
            .cloned()
            .unwrap_or(record))
    }

    /// Ask the backend about every pending record and settle the ones it
    /// knows. Returns how many records changed status.
    ///
    /// Lookups that fail for any reason leave the record pending.
    pub async fn reconcile_pending(&mut self) -> usize {
        let pending: Vec<String> = match self.wallet.as_ref() {
            Some(wallet) => wallet
                .transactions
                .iter()
                .filter(|t| t.status == TxStatus::Pending && !t.hash.is_empty())
                .map(|t| t.hash.clone())
                .collect(),
            None => return 0,
        };

        let mut outcomes = Vec::new();
        for hash in pending {
            match self.api.query_tx(&hash).await {
                Ok(response) => {
                    if let Some(status) = response.outcome() {
                        let height = response.tx_data.as_ref().and_then(tx_height);
                        outcomes.push((hash, status, height));
                    }
                }
                Err(e) => debug!(hash = %hash, error = %e, "transaction not settled yet"),
            }
        }

        let Some(wallet) = self.wallet.as_mut() else {
            return 0;
        };
        let mut settled = 0;
        for (hash, status, height) in outcomes {
            for tx in wallet
                .transactions
                .iter_mut()
                .filter(|t| t.hash == hash && t.status == TxStatus::Pending)
            {
                tx.status = status;
                if height.is_some() {
                    tx.height = height;
                }
                settled += 1;
                info!(hash = %hash, status = %status, "transaction settled");
            }
        }
        settled
    }

    /// Forget the loaded wallet and the remembered session.
    pub fn disconnect_wallet(&mut self) -> Result<()> {
        self.last_error = None;
        self.wallet = None;
        self.state = ConnectionState::Disconnected;

        let cleared = self
            .store
            .remove(LAST_CONNECTED_ADDRESS)
            .and_then(|_| self.store.remove(WALLET_CONNECTED));
        if let Err(e) = cleared {
            return self.fail("disconnect_wallet", e);
        }
        info!("wallet disconnected");
        Ok(())
    }

    /// The loaded history narrowed by `filter`, newest first.
    pub fn filtered_transactions(&self, filter: &TxFilter) -> Vec<&Transaction> {
        self.wallet
            .as_ref()
            .map(|w| filter.apply(&w.transactions))
            .unwrap_or_default()
    }
}

fn tx_height(data: &Value) -> Option<u64> {
    match data.get("height")? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::mock::MockChainApi;
    use crate::storage::{MemoryStore, ACCOUNTS};
    use std::sync::Arc;

    type TestWallet = WalletController<MockChainApi, Arc<MemoryStore>>;

    fn controller() -> (TestWallet, MockChainApi, Arc<MemoryStore>) {
        let api = MockChainApi::default();
        let store = Arc::new(MemoryStore::new());
        let wallet = WalletController::new(api.clone(), Arc::clone(&store)).unwrap();
        (wallet, api, store)
    }

    async fn connected_as_alice() -> (TestWallet, MockChainApi, Arc<MemoryStore>) {
        let (mut wallet, api, store) = controller();
        wallet.create_account("alice").await.unwrap();
        wallet.connect_wallet(None).await.unwrap();
        (wallet, api, store)
    }

    #[tokio::test]
    async fn test_create_account_appends_and_persists() {
        let (mut wallet, api, store) = controller();
        let account = wallet.create_account("alice").await.unwrap();

        assert_eq!(wallet.accounts().len(), 1);
        assert_eq!(account.name, "alice");
        assert_eq!(api.ledger().address_of("alice"), Some(account.address.clone()));

        let persisted = store.get(ACCOUNTS).unwrap().unwrap();
        assert!(persisted.contains(&account.address));
    }

    #[tokio::test]
    async fn test_backend_rejection_surfaces_unchanged() {
        let (mut wallet, _api, _store) = controller();
        wallet.create_account("alice").await.unwrap();

        let err = wallet.create_account("alice").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Rejected);
        assert_eq!(wallet.last_error(), Some("key alice already exists"));
        assert_eq!(wallet.accounts().len(), 1);
    }

    #[tokio::test]
    async fn test_connect_without_accounts_fails() {
        let (mut wallet, _api, _store) = controller();
        let err = wallet.connect_wallet(None).await.unwrap_err();

        assert!(matches!(err, WalletError::NoAccount));
        assert!(!wallet.is_connected());
        assert_eq!(wallet.state(), ConnectionState::Disconnected);
        assert_eq!(wallet.last_error(), Some("no account available"));
    }

    #[tokio::test]
    async fn test_connect_builds_wallet_info() {
        let (wallet, _api, store) = connected_as_alice().await;
        let info = wallet.wallet().unwrap();

        assert!(wallet.is_connected());
        assert_eq!(info.account_name.as_deref(), Some("alice"));
        assert_eq!(info.total_balance, "1000.000000");
        assert_eq!(info.available_balance, info.total_balance);
        assert!(info.delegations.is_empty());
        assert_eq!(
            store.get(LAST_CONNECTED_ADDRESS).unwrap().as_deref(),
            Some(info.address.as_str())
        );
        assert_eq!(store.get(WALLET_CONNECTED).unwrap().as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn test_send_settles_to_success() {
        let (mut wallet, api, _store) = connected_as_alice().await;
        let bob = api.ledger().create_account("bob").unwrap().address;

        let tx = wallet
            .send_transaction(&bob, "250", Some("stake"), Some("rent"))
            .await
            .unwrap();
        assert_eq!(tx.status, TxStatus::Success);

        let info = wallet.wallet().unwrap();
        let first = &info.transactions[0];
        assert_eq!(first.status, TxStatus::Success);
        assert_eq!(first.kind, TxKind::Send);
        assert_eq!(first.amount, "250");
        assert_eq!(first.denom, "stake");
        assert_eq!(first.memo.as_deref(), Some("rent"));
        assert!(first.height.is_some());
        assert_eq!(info.total_balance, "750.000000");
        assert_eq!(wallet.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_send_stays_pending_until_indexed() {
        let (mut wallet, api, _store) = connected_as_alice().await;
        api.set_indexing(false);

        let tx = wallet
            .send_transaction("cosmos1bob", "10", None, None)
            .await
            .unwrap();
        assert_eq!(tx.status, TxStatus::Pending);
        assert_eq!(wallet.wallet().unwrap().transactions[0].status, TxStatus::Pending);

        api.set_indexing(true);
        assert_eq!(wallet.reconcile_pending().await, 1);
        assert_eq!(wallet.wallet().unwrap().transactions[0].status, TxStatus::Success);
        assert_eq!(wallet.reconcile_pending().await, 0);
    }

    #[tokio::test]
    async fn test_send_requires_connection() {
        let (mut wallet, _api, _store) = controller();
        let err = wallet
            .send_transaction("cosmos1bob", "10", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::NotConnected));
        assert_eq!(wallet.last_error(), Some("wallet not connected"));
    }

    #[tokio::test]
    async fn test_send_validates_locally() {
        let (mut wallet, _api, _store) = connected_as_alice().await;

        let err = wallet.send_transaction("  ", "10", None, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);

        let err = wallet
            .send_transaction("cosmos1bob", "0", None, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert!(wallet.wallet().unwrap().transactions.is_empty());
        assert_eq!(wallet.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_insufficient_funds_returns_to_connected() {
        let (mut wallet, _api, _store) = connected_as_alice().await;
        let err = wallet
            .send_transaction("cosmos1bob", "5000", None, None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Rejected);
        assert_eq!(wallet.state(), ConnectionState::Connected);
        assert!(wallet.last_error().unwrap().contains("insufficient funds"));
        assert!(wallet.wallet().unwrap().transactions.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_recorded() {
        let (mut wallet, api, _store) = connected_as_alice().await;
        api.set_offline(true);

        let err = wallet.refresh().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(wallet.last_error().unwrap().starts_with("Network error"));
        // The previously loaded wallet is still there.
        assert!(wallet.is_connected());
    }

    #[tokio::test]
    async fn test_reconnect_keeps_history() {
        let (mut wallet, _api, _store) = connected_as_alice().await;
        wallet
            .send_transaction("cosmos1bob", "1", None, None)
            .await
            .unwrap();

        let address = wallet.wallet().unwrap().address.clone();
        let info = wallet.connect_wallet(Some(&address)).await.unwrap();
        assert_eq!(info.transactions.len(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_clears_session() {
        let (mut wallet, _api, store) = connected_as_alice().await;
        wallet.disconnect_wallet().unwrap();

        assert!(wallet.wallet().is_none());
        assert!(!wallet.is_connected());
        assert_eq!(store.get(LAST_CONNECTED_ADDRESS).unwrap(), None);
        assert_eq!(store.get(WALLET_CONNECTED).unwrap(), None);
        assert_eq!(wallet.accounts().len(), 1);
    }

    #[tokio::test]
    async fn test_resume_session_uses_remembered_address() {
        let (wallet, api, store) = connected_as_alice().await;
        let address = wallet.wallet().unwrap().address.clone();
        drop(wallet);

        let mut resumed = WalletController::new(api, Arc::clone(&store)).unwrap();
        let info = resumed.resume_session().await.unwrap().unwrap();
        assert_eq!(info.address, address);
        assert_eq!(resumed.accounts().len(), 1);
    }

    #[tokio::test]
    async fn test_filtered_history() {
        let (mut wallet, api, _store) = connected_as_alice().await;
        wallet
            .send_transaction("cosmos1bob", "1", None, None)
            .await
            .unwrap();
        api.set_indexing(false);
        wallet
            .send_transaction("cosmos1carol", "2", None, None)
            .await
            .unwrap();

        let pending = wallet.filtered_transactions(&TxFilter::new().status(TxStatus::Pending));
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].recipient, "cosmos1carol");

        let to_bob = wallet.filtered_transactions(&TxFilter::new().address("BOB"));
        assert_eq!(to_bob.len(), 1);
        assert_eq!(to_bob[0].status, TxStatus::Success);
    }

    #[tokio::test]
    async fn test_connect_with_atto_denom_balance() {
        let config = crate::config::ServerConfig {
            initial_balance: 1_000_000_000_000_000_000,
            ..Default::default()
        };
        let api = MockChainApi::with_config(&config);
        let store = Arc::new(MemoryStore::new());
        let mut wallet = WalletController::new(api, store).unwrap();
        wallet.create_account("alice").await.unwrap();

        let info = wallet.connect_wallet(None).await.unwrap();
        assert_eq!(info.total_balance, "1000000000000000000.000000");
        assert_eq!(info.available_balance, info.total_balance);
        assert!(wallet.is_connected());
        assert_eq!(wallet.last_error(), None);
    }

    struct FlakyStore {
        inner: MemoryStore,
        fail_writes: std::sync::atomic::AtomicBool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            if self.fail_writes.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(WalletError::Storage("database is locked".to_string()));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }
    }

    #[tokio::test]
    async fn test_create_account_not_kept_when_save_fails() {
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            fail_writes: std::sync::atomic::AtomicBool::new(false),
        });
        let mut wallet = WalletController::new(MockChainApi::default(), Arc::clone(&store)).unwrap();
        wallet.create_account("alice").await.unwrap();

        store
            .fail_writes
            .store(true, std::sync::atomic::Ordering::SeqCst);
        let err = wallet.create_account("bob").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Local);
        assert_eq!(wallet.accounts().len(), 1);
        assert!(wallet.accounts().get("bob").is_none());
        assert_eq!(wallet.last_error(), Some(err.to_string().as_str()));
    }

    #[tokio::test]
    async fn test_resume_session_reports_offline_backend() {
        let (wallet, api, store) = connected_as_alice().await;
        drop(wallet);
        api.set_offline(true);

        let mut resumed = WalletController::new(api, Arc::clone(&store)).unwrap();
        let err = resumed.resume_session().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(resumed.last_error(), Some(err.to_string().as_str()));
        assert!(!resumed.is_connected());
        assert_eq!(store.get(WALLET_CONNECTED).unwrap().as_deref(), Some("true"));
    }
}
