//! Cosmos Demo - wallet and explorer client for a demo Cosmos-style chain
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Data Model
//! - [`types`] - Blocks, transactions, balances and wallet read-models
//! - [`amount`] - Decimal amount parsing and formatting
//!
//! ## Backend Access
//! - [`wire`] - REST request/response envelopes
//! - [`client`] - `ChainApi` interface and its HTTP implementation
//! - [`ledger`] - In-memory account and transfer book
//! - [`mock`] - In-process `ChainApi` over a ledger
//!
//! ## Explorer
//! - [`explorer`] - Block, transaction and chain-status reads (generated)
//!
//! ## Wallet
//! - [`wallet`] - Wallet session controller
//! - [`accounts`] - Locally known accounts
//! - [`filter`] - Transaction list filtering
//! - [`storage`] - Key-value persistence (SQLite)
//!
//! ## Integration
//! - [`api`] - Stub REST backend (axum)
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//! - [`cli`] - CLI utilities

#![forbid(unsafe_code)]

// ============================================================================
// Data Model
// ============================================================================
pub mod amount;
pub mod types;

// ============================================================================
// Backend Access
// ============================================================================
pub mod client;
pub mod ledger;
pub mod mock;
pub mod wire;

// ============================================================================
// Explorer
// ============================================================================
pub mod explorer;

// ============================================================================
// Wallet
// ============================================================================
pub mod accounts;
pub mod filter;
pub mod storage;
pub mod wallet;

// ============================================================================
// Integration
// ============================================================================
#[cfg(feature = "api")]
pub mod api;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod cli;
pub mod config;
pub mod error;

pub use client::{ChainApi, HttpChainApi};
pub use error::{Result, WalletError};
pub use explorer::{Explorer, MockExplorer};
pub use filter::TxFilter;
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use wallet::{ConnectionState, WalletController};
