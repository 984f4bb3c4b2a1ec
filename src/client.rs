//! Data-access interface for the wallet backend and its HTTP implementation

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::{Result, WalletError};
use crate::wire::{
    check, AccountResponse, BalanceResponse, CreateAccountRequest, Envelope, Enveloped,
    HealthResponse, NodeStatusResponse, TransactionResponse, TransferRequest, TransferResponse,
    UNSPECIFIED_FAILURE,
};

/// The one interface through which wallet code reaches the backend.
///
/// Implementations return an envelope only when it reports success; a
/// `success: false` answer surfaces as [`WalletError::Rejected`] and a failed
/// request as [`WalletError::Transport`]. Nothing is retried.
#[async_trait]
pub trait ChainApi: Send + Sync {
    async fn health(&self) -> Result<HealthResponse>;

    async fn create_account(&self, name: &str) -> Result<AccountResponse>;

    async fn account_balance(&self, address: &str) -> Result<BalanceResponse>;

    async fn transfer(&self, request: &TransferRequest) -> Result<TransferResponse>;

    async fn query_tx(&self, hash: &str) -> Result<TransactionResponse>;

    async fn node_status(&self) -> Result<NodeStatusResponse>;
}

#[async_trait]
impl<T: ChainApi + ?Sized> ChainApi for Arc<T> {
    async fn health(&self) -> Result<HealthResponse> {
        (**self).health().await
    }

    async fn create_account(&self, name: &str) -> Result<AccountResponse> {
        (**self).create_account(name).await
    }

    async fn account_balance(&self, address: &str) -> Result<BalanceResponse> {
        (**self).account_balance(address).await
    }

    async fn transfer(&self, request: &TransferRequest) -> Result<TransferResponse> {
        (**self).transfer(request).await
    }

    async fn query_tx(&self, hash: &str) -> Result<TransactionResponse> {
        (**self).query_tx(hash).await
    }

    async fn node_status(&self) -> Result<NodeStatusResponse> {
        (**self).node_status().await
    }
}

/// reqwest-backed client for the REST contract.
#[derive(Debug, Clone)]
pub struct HttpChainApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpChainApi {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| WalletError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T>(&self, path: &str, query: &[(&str, &str)]) -> Result<T>
    where
        T: DeserializeOwned + Enveloped,
    {
        debug!(path, "GET");
        let response = self.http.get(self.url(path)).query(query).send().await?;
        decode_envelope(response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned + Enveloped,
    {
        debug!(path, "POST");
        let response = self.http.post(self.url(path)).json(body).send().await?;
        decode_envelope(response).await
    }
}

/// Decode a response body into an envelope.
///
/// Non-2xx statuses still count as application rejections when the body is an
/// envelope; otherwise they are transport failures.
async fn decode_envelope<T>(response: reqwest::Response) -> Result<T>
where
    T: DeserializeOwned + Enveloped,
{
    let status = response.status();
    let text = response.text().await?;
    parse_envelope(status, &text)
}

fn parse_envelope<T>(status: StatusCode, text: &str) -> Result<T>
where
    T: DeserializeOwned + Enveloped,
{
    if status.is_success() {
        let parsed: T = serde_json::from_str(text).map_err(|e| {
            WalletError::Transport(format!("Undecodable response body: {}", e))
        })?;
        return check(parsed);
    }

    match serde_json::from_str::<Envelope>(text) {
        Ok(envelope) if !envelope.success && envelope.error.is_some() => {
            let message = envelope
                .error
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| UNSPECIFIED_FAILURE.to_string());
            Err(WalletError::Rejected(message))
        }
        _ => Err(WalletError::Transport(format!(
            "HTTP {}: {}",
            status.as_u16(),
            text.trim()
        ))),
    }
}

#[async_trait]
impl ChainApi for HttpChainApi {
    async fn health(&self) -> Result<HealthResponse> {
        let response = self.http.get(self.url("/health")).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(WalletError::Transport(format!(
                "HTTP {}: {}",
                status.as_u16(),
                text.trim()
            )));
        }
        serde_json::from_str(&text)
            .map_err(|e| WalletError::Transport(format!("Undecodable response body: {}", e)))
    }

    async fn create_account(&self, name: &str) -> Result<AccountResponse> {
        let body = CreateAccountRequest {
            name: name.to_string(),
        };
        self.post("/create_account", &body).await
    }

    async fn account_balance(&self, address: &str) -> Result<BalanceResponse> {
        self.get("/account_balance", &[("address", address)]).await
    }

    async fn transfer(&self, request: &TransferRequest) -> Result<TransferResponse> {
        self.post("/transfer", request).await
    }

    async fn query_tx(&self, hash: &str) -> Result<TransactionResponse> {
        self.get("/query_tx", &[("hash", hash)]).await
    }

    async fn node_status(&self) -> Result<NodeStatusResponse> {
        self.get("/node_status", &[]).await
    }
}
