//! Error types for the Cosmos Demo client

use thiserror::Error;

/// Broad classification of a failure.
///
/// All kinds end up as one message in the wallet's error channel; the kind is
/// only kept so callers and logs can tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network, DNS, timeout or an undecodable response.
    Transport,
    /// The backend answered with `success: false`.
    Rejected,
    /// A client-side check failed before the backend was contacted.
    Precondition,
    /// Storage, configuration or serialization trouble on this machine.
    Local,
}

#[derive(Debug, Clone, Error)]
pub enum WalletError {
    #[error("Network error: {0}")]
    Transport(String),

    /// Backend rejection; the message is the backend's own text, unchanged.
    #[error("{0}")]
    Rejected(String),

    #[error("wallet not connected")]
    NotConnected,

    #[error("no account available")]
    NoAccount,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl WalletError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::Transport(_) => ErrorKind::Transport,
            WalletError::Rejected(_) => ErrorKind::Rejected,
            WalletError::NotConnected
            | WalletError::NoAccount
            | WalletError::InvalidInput(_)
            | WalletError::NotFound(_) => ErrorKind::Precondition,
            WalletError::Storage(_) | WalletError::Config(_) | WalletError::Serialization(_) => {
                ErrorKind::Local
            }
        }
    }
}

impl From<std::io::Error> for WalletError {
    fn from(err: std::io::Error) -> Self {
        WalletError::Storage(err.to_string())
    }
}

impl From<rusqlite::Error> for WalletError {
    fn from(err: rusqlite::Error) -> Self {
        WalletError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(err: serde_json::Error) -> Self {
        WalletError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for WalletError {
    fn from(err: toml::de::Error) -> Self {
        WalletError::Config(err.to_string())
    }
}

impl From<reqwest::Error> for WalletError {
    fn from(err: reqwest::Error) -> Self {
        WalletError::Transport(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, WalletError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_message_is_unchanged() {
        let err = WalletError::Rejected("insufficient funds: 5stake < 10stake".to_string());
        assert_eq!(err.to_string(), "insufficient funds: 5stake < 10stake");
        assert_eq!(err.kind(), ErrorKind::Rejected);
    }

    #[test]
    fn test_precondition_messages() {
        assert_eq!(WalletError::NoAccount.to_string(), "no account available");
        assert_eq!(WalletError::NotConnected.to_string(), "wallet not connected");
        assert_eq!(WalletError::NoAccount.kind(), ErrorKind::Precondition);
    }

    #[test]
    fn test_io_error_is_local() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: WalletError = io.into();
        assert_eq!(err.kind(), ErrorKind::Local);
    }
}
