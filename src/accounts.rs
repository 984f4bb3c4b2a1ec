//! Locally known accounts
//!
//! The backend keys transfers by account name while the wallet works with
//! addresses, so the client keeps its own ordered list of `{name, address}`
//! pairs. The list is persisted as a JSON array under
//! [`ACCOUNTS`](crate::storage::ACCOUNTS), in the order accounts were
//! learned.

use crate::error::{Result, WalletError};
use crate::storage::{KeyValueStore, ACCOUNTS};
use crate::types::Account;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::warn;

const MAX_NAME_LENGTH: usize = 64;
const MAX_ADDRESS_LENGTH: usize = 128;

/// Thread-safe, ordered account list
#[derive(Debug, Clone, Default)]
pub struct AccountBook {
    inner: Arc<RwLock<Vec<Account>>>,
}

impl AccountBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the persisted list. A missing key is an empty book.
    ///
    /// Entries that fail validation are skipped with a warning rather than
    /// failing the whole load.
    pub fn load(store: &dyn KeyValueStore) -> Result<Self> {
        let Some(raw) = store.get(ACCOUNTS)? else {
            return Ok(Self::new());
        };
        if raw.trim().is_empty() {
            return Ok(Self::new());
        }

        let stored: Vec<Account> = serde_json::from_str(&raw).map_err(|e| {
            WalletError::Serialization(format!("Failed to parse stored accounts: {}", e))
        })?;

        let book = Self::new();
        for account in stored {
            if let Err(e) = validate_name(&account.name).and(validate_address(&account.address)) {
                warn!(name = %account.name, error = %e, "skipping invalid stored account");
                continue;
            }
            upsert(&mut book.inner.write(), account);
        }
        Ok(book)
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<()> {
        let json = serde_json::to_string(&*self.inner.read())?;
        store.set(ACCOUNTS, &json)
    }

    /// Record `name → address`.
    ///
    /// A name already in the book keeps its position and takes the new
    /// address.
    pub fn add(&self, name: &str, address: &str) -> Result<Account> {
        let account = new_account(name, address)?;
        Ok(upsert(&mut self.inner.write(), account))
    }

    /// [`add`](Self::add), but the book only changes once the updated list
    /// is written to `store`.
    pub fn add_and_save(
        &self,
        name: &str,
        address: &str,
        store: &dyn KeyValueStore,
    ) -> Result<Account> {
        let account = new_account(name, address)?;
        let mut inner = self.inner.write();
        let mut updated = inner.clone();
        let account = upsert(&mut updated, account);
        store.set(ACCOUNTS, &serde_json::to_string(&updated)?)?;
        *inner = updated;
        Ok(account)
    }

    /// Look up by name, ignoring case. Exact-case matches win.
    pub fn get(&self, name: &str) -> Option<Account> {
        let inner = self.inner.read();
        let name = name.trim();
        inner
            .iter()
            .find(|a| a.name == name)
            .or_else(|| inner.iter().find(|a| a.name.eq_ignore_ascii_case(name)))
            .cloned()
    }

    /// Reverse lookup. The earliest entry wins when several share an address.
    pub fn get_by_address(&self, address: &str) -> Option<Account> {
        let inner = self.inner.read();
        inner.iter().find(|a| a.address == address.trim()).cloned()
    }

    pub fn first(&self) -> Option<Account> {
        self.inner.read().first().cloned()
    }

    pub fn remove(&self, name: &str) -> Result<Account> {
        let mut inner = self.inner.write();
        let position = inner
            .iter()
            .position(|a| a.name == name.trim())
            .ok_or_else(|| WalletError::NotFound(format!("account '{}'", name.trim())))?;
        Ok(inner.remove(position))
    }

    /// Case-insensitive substring match on name or address.
    pub fn search(&self, query: &str) -> Vec<Account> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.inner
            .read()
            .iter()
            .filter(|a| {
                a.name.to_lowercase().contains(&query) || a.address.to_lowercase().contains(&query)
            })
            .cloned()
            .collect()
    }

    /// All accounts in the order they were learned
    pub fn list(&self) -> Vec<Account> {
        self.inner.read().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn new_account(name: &str, address: &str) -> Result<Account> {
    let name = name.trim();
    let address = address.trim();
    validate_name(name)?;
    validate_address(address)?;
    Ok(Account {
        name: name.to_string(),
        address: address.to_string(),
        created_at: chrono::Utc::now().to_rfc3339(),
    })
}

fn upsert(accounts: &mut Vec<Account>, account: Account) -> Account {
    if let Some(existing) = accounts.iter_mut().find(|a| a.name == account.name) {
        existing.address = account.address;
        return existing.clone();
    }
    accounts.push(account.clone());
    account
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(WalletError::InvalidInput(
            "account name cannot be empty".to_string(),
        ));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(WalletError::InvalidInput(format!(
            "account name too long (max {} characters)",
            MAX_NAME_LENGTH
        )));
    }

    Ok(())
}

fn validate_address(address: &str) -> Result<()> {
    if address.is_empty() {
        return Err(WalletError::InvalidInput(
            "address cannot be empty".to_string(),
        ));
    }

    if address.len() > MAX_ADDRESS_LENGTH {
        return Err(WalletError::InvalidInput(format!(
            "address too long (max {} characters)",
            MAX_ADDRESS_LENGTH
        )));
    }

    if !address.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(WalletError::InvalidInput(format!(
            "invalid address format '{}'",
            address
        )));
    }

    Ok(())
}
