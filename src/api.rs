//! Stub REST backend for local development
//!
//! Serves the wallet REST contract from an in-memory [`Ledger`]: account
//! creation, balances, transfers, transaction lookup and node status. It is a
//! fixture for exercising the client, not a chain.

use axum::{
    extract::{rejection::JsonRejection, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::{Result, WalletError};
use crate::ledger::{Ledger, LedgerError};
use crate::wire::{CreateAccountRequest, HealthResponse, TransferRequest};

/// Shared state of the stub backend
pub struct StubNode {
    ledger: Arc<Ledger>,
    requests: AtomicU64,
    failures: AtomicU64,
}

impl StubNode {
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_ledger(Arc::new(Ledger::new(config)))
    }

    pub fn with_ledger(ledger: Arc<Ledger>) -> Self {
        Self {
            ledger,
            requests: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    pub fn new_shared(config: &ServerConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// `(requests served, requests answered with a non-2xx status)`
    pub fn request_counts(&self) -> (u64, u64) {
        (
            self.requests.load(Ordering::Relaxed),
            self.failures.load(Ordering::Relaxed),
        )
    }
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Ledger(LedgerError),
    InvalidInput(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Ledger(e) if e.is_not_found() => (StatusCode::NOT_FOUND, e.to_string()),
            ApiError::Ledger(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        (
            status,
            Json(ErrorEnvelope {
                success: false,
                error: message,
            }),
        )
            .into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    success: bool,
    error: String,
}

#[derive(Debug, Deserialize)]
struct AddressQuery {
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HashQuery {
    hash: Option<String>,
}

fn required(value: Option<String>, name: &str) -> std::result::Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::InvalidInput(format!("missing required parameter '{}'", name)))
}

// ============================================================================
// Middleware
// ============================================================================

/// Logs method, path, status and duration of every request.
async fn logging_middleware(
    State(node): State<Arc<StubNode>>,
    req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status();

    node.requests.fetch_add(1, Ordering::Relaxed);
    if !status.is_success() {
        node.failures.fetch_add(1, Ordering::Relaxed);
    }

    tracing::info!(
        method = %method,
        path = %path,
        status = %status.as_u16(),
        duration_ms = %duration.as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the router serving the REST contract.
pub fn build_router(node: Arc<StubNode>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/create_account", post(create_account))
        .route("/account_balance", get(account_balance))
        .route("/transfer", post(transfer))
        .route("/query_tx", get(query_tx))
        .route("/node_status", get(node_status))
        .layer(middleware::from_fn_with_state(node.clone(), logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(node)
        .layer(CorsLayer::permissive())
}

/// Serve `node` on an already bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, node: Arc<StubNode>) -> Result<()> {
    axum::serve(listener, build_router(node))
        .await
        .map_err(|e| WalletError::Transport(format!("stub server stopped: {}", e)))
}

/// Bind `0.0.0.0:<port>` and serve a fresh ledger.
pub async fn run_stub_server(config: &ServerConfig) -> Result<()> {
    let node = StubNode::new_shared(config);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| WalletError::Transport(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!(
        %addr,
        chain_id = %config.chain_id,
        denom = %config.denom,
        initial_balance = %config.initial_balance,
        "stub backend listening"
    );

    serve(listener, node).await
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn create_account(
    State(node): State<Arc<StubNode>>,
    body: std::result::Result<Json<CreateAccountRequest>, JsonRejection>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    Ok(Json(node.ledger.create_account(&request.name)?))
}

async fn account_balance(
    State(node): State<Arc<StubNode>>,
    Query(query): Query<AddressQuery>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let address = required(query.address, "address")?;
    Ok(Json(node.ledger.balance(&address)?))
}

async fn transfer(
    State(node): State<Arc<StubNode>>,
    body: std::result::Result<Json<TransferRequest>, JsonRejection>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    Ok(Json(node.ledger.transfer(&request)?))
}

async fn query_tx(
    State(node): State<Arc<StubNode>>,
    Query(query): Query<HashQuery>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let hash = required(query.hash, "hash")?;
    Ok(Json(node.ledger.query_tx(&hash)?))
}

async fn node_status(State(node): State<Arc<StubNode>>) -> impl IntoResponse {
    Json(node.ledger.node_status())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_errors_map_to_404() {
        let response = ApiError::from(LedgerError::UnknownTx("AB".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ApiError::from(LedgerError::EmptyName).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_required_parameter() {
        assert_eq!(required(Some(" abc ".to_string()), "hash").unwrap(), "abc");
        assert!(required(Some("  ".to_string()), "hash").is_err());
        assert!(required(None, "hash").is_err());
    }

    #[test]
    fn test_fresh_node_counts() {
        let node = StubNode::new(&ServerConfig::default());
        assert_eq!(node.request_counts(), (0, 0));
        assert_eq!(node.ledger().account_count(), 0);
    }
}
