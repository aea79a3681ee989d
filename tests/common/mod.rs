//! Shared test harness: an in-memory chain behind `ChainClient`

#![allow(dead_code)]

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use deposit_sentry::models::config::{DepositPolicy, ReceiptsMode};
use deposit_sentry::models::errors::{AppError, AppResult, RpcError};
use deposit_sentry::models::types::{RawTransaction, TransactionRequest};
use deposit_sentry::providers::chain::{Block, BlockTag, ChainClient, Log, Receipt};
use deposit_sentry::utils::constants::DEPLOYMENT_EVENT_TOPIC;
use deposit_sentry::{DepositGuard, RiskRuleEngine};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

sol! {
    function transfer(address to, uint256 amount) external returns (bool);
}

pub const POLYGON: &str = "eip155:137";

/// Deterministic fake chain. Contracts appear at a creation block and keep
/// their code from then on.
#[derive(Default)]
pub struct MockChain {
    pub latest: u64,
    contracts: HashMap<Address, (u64, Bytes)>,
    blocks: HashMap<u64, Vec<Receipt>>,
    block_receipts_unsupported: bool,
    failing: HashSet<&'static str>,
    delay: Option<Duration>,
    receipts_pruned: bool,
    code_queries: AtomicUsize,
    receipt_queries: AtomicUsize,
    receipts_in_flight: AtomicUsize,
    peak_receipts_in_flight: AtomicUsize,
}

impl MockChain {
    pub fn new(latest: u64) -> Self {
        Self {
            latest,
            ..Self::default()
        }
    }

    pub fn with_contract(mut self, address: Address, created_at: u64, code: Bytes) -> Self {
        self.contracts.insert(address, (created_at, code));
        self
    }

    /// Receipts of `block`, in block order
    pub fn with_receipts(mut self, block: u64, receipts: Vec<Receipt>) -> Self {
        self.blocks.insert(block, receipts);
        self
    }

    /// Node answers `eth_getBlockReceipts` with method-not-found
    pub fn without_block_receipts(mut self) -> Self {
        self.block_receipts_unsupported = true;
        self
    }

    /// Node knows the block but answers `null` for each of its receipts
    pub fn with_pruned_receipts(mut self) -> Self {
        self.receipts_pruned = true;
        self
    }

    /// Appends `count` transactions to `block`, none of which emit the deployment log
    pub fn with_busy_block(mut self, block: u64, count: usize) -> Self {
        self.blocks
            .entry(block)
            .or_default()
            .extend((0..count).map(|i| noise_receipt(&format!("0x{:064x}", i + 1))));
        self
    }

    /// Every call of `method` fails with a connection error
    pub fn failing(mut self, method: &'static str) -> Self {
        self.failing.insert(method);
        self
    }

    /// Every call sleeps before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn code_queries(&self) -> usize {
        self.code_queries.load(Ordering::SeqCst)
    }

    pub fn receipt_queries(&self) -> usize {
        self.receipt_queries.load(Ordering::SeqCst)
    }

    /// Most `eth_getTransactionReceipt` calls that were pending at once
    pub fn peak_receipts_in_flight(&self) -> usize {
        self.peak_receipts_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self, method: &'static str) -> AppResult<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(method) {
            return Err(AppError::rpc_connection_failed(format!("{} unavailable", method)));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn get_code(&self, address: Address, block: BlockTag) -> AppResult<Bytes> {
        self.enter("eth_getCode").await?;
        self.code_queries.fetch_add(1, Ordering::SeqCst);
        let height = match block {
            BlockTag::Latest => self.latest,
            BlockTag::Number(n) => n,
        };
        Ok(match self.contracts.get(&address) {
            Some((created, code)) if height >= *created => code.clone(),
            _ => Bytes::new(),
        })
    }

    async fn get_latest_block_number(&self) -> AppResult<u64> {
        self.enter("eth_blockNumber").await?;
        Ok(self.latest)
    }

    async fn get_block(&self, number: u64) -> AppResult<Option<Block>> {
        self.enter("eth_getBlockByNumber").await?;
        Ok(self.blocks.get(&number).map(|receipts| Block {
            number: Some(format!("0x{:x}", number)),
            transactions: receipts
                .iter()
                .filter_map(|r| r.transaction_hash.clone())
                .collect(),
        }))
    }

    async fn get_transaction_receipt(&self, tx_hash: &str) -> AppResult<Option<Receipt>> {
        let in_flight = self.receipts_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_receipts_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        let entered = self.enter("eth_getTransactionReceipt").await;
        self.receipts_in_flight.fetch_sub(1, Ordering::SeqCst);
        entered?;

        self.receipt_queries.fetch_add(1, Ordering::SeqCst);
        if self.receipts_pruned {
            return Ok(None);
        }
        Ok(self
            .blocks
            .values()
            .flatten()
            .find(|r| r.transaction_hash.as_deref() == Some(tx_hash))
            .cloned())
    }

    async fn get_block_receipts(&self, number: u64) -> AppResult<Vec<Receipt>> {
        self.enter("eth_getBlockReceipts").await?;
        if self.block_receipts_unsupported {
            return Err(AppError::rpc_error(RpcError {
                code: -32601,
                message: "the method eth_getBlockReceipts does not exist/is not available"
                    .to_string(),
            }));
        }
        Ok(self.blocks.get(&number).cloned().unwrap_or_default())
    }
}

pub fn policy() -> DepositPolicy {
    DepositPolicy::polymarket().expect("built-in policy")
}

pub fn proxy_code() -> Bytes {
    policy().proxy_wallet_code
}

pub fn guard(chain: Arc<MockChain>, mode: ReceiptsMode) -> DepositGuard<MockChain> {
    guard_with_timeout(chain, mode, Duration::from_secs(5))
}

pub fn guard_with_timeout(
    chain: Arc<MockChain>,
    mode: ReceiptsMode,
    timeout: Duration,
) -> DepositGuard<MockChain> {
    DepositGuard::with_policy(
        chain,
        policy(),
        mode,
        RiskRuleEngine::standard().expect("standard table"),
        timeout,
    )
    .expect("guard")
}

/// Receipt carrying one deployment log for (`to`, `by`)
pub fn deployment_receipt(tx_hash: &str, to: Address, by: Address) -> Receipt {
    let mut data = vec![0u8; 64];
    data[12..32].copy_from_slice(to.as_slice());
    data[44..64].copy_from_slice(by.as_slice());
    Receipt {
        transaction_hash: Some(tx_hash.to_string()),
        logs: vec![Log {
            address: None,
            topics: vec![DEPLOYMENT_EVENT_TOPIC.to_string()],
            data: format!("0x{}", hex::encode(data)),
        }],
    }
}

/// Receipt with an unrelated log
pub fn noise_receipt(tx_hash: &str) -> Receipt {
    Receipt {
        transaction_hash: Some(tx_hash.to_string()),
        logs: vec![Log {
            address: None,
            topics: vec![format!("0x{}", "11".repeat(32))],
            data: "0x".to_string(),
        }],
    }
}

pub fn erc20_request(
    token: Address,
    recipient: Address,
    amount: u64,
    from: Address,
    chain_id: &str,
) -> TransactionRequest {
    let data = transferCall {
        to: recipient,
        amount: U256::from(amount),
    }
    .abi_encode();
    TransactionRequest {
        transaction: RawTransaction {
            to: token.to_string(),
            value: "0x0".to_string(),
            data: format!("0x{}", hex::encode(data)),
            from: from.to_string(),
        },
        chain_id: chain_id.to_string(),
        transaction_origin: "https://polymarket.com".to_string(),
    }
}

pub fn native_request(recipient: Address, value: u64, from: Address) -> TransactionRequest {
    TransactionRequest {
        transaction: RawTransaction {
            to: recipient.to_string(),
            value: format!("0x{:x}", value),
            data: "0x".to_string(),
            from: from.to_string(),
        },
        chain_id: POLYGON.to_string(),
        transaction_origin: "https://polymarket.com".to_string(),
    }
}
