//! Block explorer reads
//!
//! The REST backend has no block or transaction listing, so explorer data
//! comes from [`MockExplorer`], which invents plausible records on every call.
//! Nothing it returns is remembered: asking twice for the same height gives
//! two different blocks. Explorer reads never touch wallet state.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tracing::debug;

use crate::config::ExplorerConfig;
use crate::error::{Result, WalletError};
use crate::types::{Block, BlockDetails, ChainStatus, Transaction, TxKind, TxStatus};

const BASE_HEIGHT: u64 = 100_000;
const HEIGHT_SPREAD: u64 = 1_000;
const BLOCK_INTERVAL_MINUTES: i64 = 10;
const MAX_TXS_PER_BLOCK: u32 = 5;
const MAX_BLOCK_GAS_USED: u64 = 100_000;
const BLOCK_GAS_LIMIT: u64 = 200_000;
const MAX_TX_GAS_USED: u64 = 50_000;
const TX_GAS_WANTED: u64 = 200_000;
const MAX_TX_AMOUNT: u64 = 1_000;
const TX_DENOM: &str = "udemo";
const TX_FEE: &str = "0.01";
const TX_MEMO: &str = "transaction memo";
const FAILURE_RATE: f64 = 0.1;
const BLOCK_TIME_SECS: f64 = 6.0;
const VALIDATOR_COUNT: u32 = 100;

/// Read-only explorer queries.
#[async_trait]
pub trait Explorer: Send + Sync {
    /// The `count` most recent blocks, newest first.
    async fn latest_blocks(&self, count: usize) -> Result<Vec<Block>>;

    /// One block with its transactions. Height 0 does not exist.
    async fn block(&self, height: u64) -> Result<BlockDetails>;

    /// The `count` most recent transactions, newest first.
    async fn recent_transactions(&self, count: usize) -> Result<Vec<Transaction>>;

    async fn transaction(&self, hash: &str) -> Result<Transaction>;

    async fn chain_status(&self) -> Result<ChainStatus>;
}

/// Random record generator with simulated network latency.
pub struct MockExplorer {
    rng: Mutex<StdRng>,
    latency_ms: (u64, u64),
}

impl MockExplorer {
    pub fn new(config: &ExplorerConfig) -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
            latency_ms: (config.latency_min_ms, config.latency_max_ms),
        }
    }

    /// Deterministic generator with no latency.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            latency_ms: (0, 0),
        }
    }

    pub fn with_latency(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.latency_ms = (min_ms.min(max_ms), min_ms.max(max_ms));
        self
    }

    async fn simulate_latency(&self) {
        let (min, max) = self.latency_ms;
        if max == 0 {
            return;
        }
        let delay = self.rng.lock().gen_range(min..=max);
        debug!(delay_ms = delay, "simulated explorer latency");
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    fn gen_latest_height(rng: &mut StdRng) -> u64 {
        BASE_HEIGHT + rng.gen_range(0..HEIGHT_SPREAD)
    }

    fn gen_block(rng: &mut StdRng, height: u64, age: ChronoDuration) -> Block {
        Block {
            height,
            hash: format!("0x{}", hex_digits(rng, 16)),
            previous_hash: format!("0x{}", hex_digits(rng, 16)),
            timestamp: Utc::now() - age,
            proposer: format!("cosmos1validator{}", hex_digits(rng, 8)),
            tx_count: rng.gen_range(0..MAX_TXS_PER_BLOCK),
            gas_used: rng.gen_range(0..MAX_BLOCK_GAS_USED),
            gas_limit: BLOCK_GAS_LIMIT,
        }
    }

    fn gen_transaction(
        rng: &mut StdRng,
        hash: String,
        height: u64,
        age: ChronoDuration,
    ) -> Transaction {
        let kind = if rng.gen_bool(0.5) {
            TxKind::Transfer
        } else {
            TxKind::Delegate
        };
        let status = if rng.gen_bool(FAILURE_RATE) {
            TxStatus::Failed
        } else {
            TxStatus::Success
        };
        let memo = rng.gen_bool(0.5).then(|| TX_MEMO.to_string());

        Transaction {
            hash,
            height: Some(height),
            kind,
            status,
            timestamp: Utc::now() - age,
            sender: format!("cosmos1sender{}", hex_digits(rng, 8)),
            recipient: format!("cosmos1recipient{}", hex_digits(rng, 8)),
            amount: rng.gen_range(0..MAX_TX_AMOUNT).to_string(),
            denom: TX_DENOM.to_string(),
            fee: Some(TX_FEE.to_string()),
            memo,
            gas_used: Some(rng.gen_range(0..MAX_TX_GAS_USED)),
            gas_wanted: Some(TX_GAS_WANTED),
        }
    }

    fn gen_blocks(&self, count: usize) -> Vec<Block> {
        let mut rng = self.rng.lock();
        let latest = Self::gen_latest_height(&mut rng);
        (0..count as u64)
            .take_while(|i| *i < latest)
            .map(|i| {
                let age = ChronoDuration::minutes(BLOCK_INTERVAL_MINUTES * i as i64);
                Self::gen_block(&mut rng, latest - i, age)
            })
            .collect()
    }

    fn gen_block_details(&self, height: u64) -> BlockDetails {
        let mut rng = self.rng.lock();
        let age = ChronoDuration::milliseconds(rng.gen_range(0..3_600_000));
        let block = Self::gen_block(&mut rng, height, age);
        let transactions = (0..block.tx_count)
            .map(|_| {
                let hash = format!("0x{}", hex_digits(&mut rng, 28));
                Self::gen_transaction(&mut rng, hash, height, age)
            })
            .collect();
        BlockDetails {
            block,
            transactions,
        }
    }

    fn gen_recent_transactions(&self, count: usize) -> Vec<Transaction> {
        let mut rng = self.rng.lock();
        let latest = Self::gen_latest_height(&mut rng);
        (0..count)
            .map(|i| {
                let height = latest - rng.gen_range(0..10);
                let hash = format!("0x{}", hex_digits(&mut rng, 16));
                let age = ChronoDuration::minutes(BLOCK_INTERVAL_MINUTES * i as i64);
                Self::gen_transaction(&mut rng, hash, height, age)
            })
            .collect()
    }

    fn gen_transaction_by_hash(&self, hash: &str) -> Transaction {
        let mut rng = self.rng.lock();
        let height = rng.gen_range(1_000..2_000);
        let age = ChronoDuration::milliseconds(rng.gen_range(0..3_600_000));
        Self::gen_transaction(&mut rng, hash.to_string(), height, age)
    }

    fn gen_chain_status(&self) -> ChainStatus {
        let mut rng = self.rng.lock();
        let bonded: u64 = rng.gen_range(50_000_000..60_000_000);
        ChainStatus {
            latest_height: Self::gen_latest_height(&mut rng),
            block_time_secs: BLOCK_TIME_SECS,
            tx_count: rng.gen_range(10_000..15_000),
            validator_count: VALIDATOR_COUNT,
            active_validators: rng.gen_range(90..=VALIDATOR_COUNT),
            bonded_tokens: format!("{}{}", bonded, TX_DENOM),
            inflation: rng.gen_range(0.07..0.13),
        }
    }
}

#[async_trait]
impl Explorer for MockExplorer {
    async fn latest_blocks(&self, count: usize) -> Result<Vec<Block>> {
        self.simulate_latency().await;
        Ok(self.gen_blocks(count))
    }

    async fn block(&self, height: u64) -> Result<BlockDetails> {
        if height == 0 {
            return Err(WalletError::InvalidInput(
                "block height must be at least 1".to_string(),
            ));
        }
        self.simulate_latency().await;
        Ok(self.gen_block_details(height))
    }

    async fn recent_transactions(&self, count: usize) -> Result<Vec<Transaction>> {
        self.simulate_latency().await;
        Ok(self.gen_recent_transactions(count))
    }

    async fn transaction(&self, hash: &str) -> Result<Transaction> {
        let hash = hash.trim();
        if hash.is_empty() {
            return Err(WalletError::InvalidInput(
                "transaction hash cannot be empty".to_string(),
            ));
        }
        self.simulate_latency().await;
        Ok(self.gen_transaction_by_hash(hash))
    }

    async fn chain_status(&self) -> Result<ChainStatus> {
        self.simulate_latency().await;
        Ok(self.gen_chain_status())
    }
}

fn hex_digits(rng: &mut StdRng, len: usize) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    (0..len)
        .map(|_| HEX[rng.gen_range(0..HEX.len())] as char)
        .collect()
}
