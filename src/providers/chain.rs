//! Chain access capability
//!
//! Everything the evaluation needs from a node, behind one trait so the
//! pipeline can be driven by a live JSON-RPC endpoint or an in-memory chain.

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::errors::{AppError, AppResult};

/// Block selector for state queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    Latest,
    Number(u64),
}

impl BlockTag {
    /// JSON-RPC parameter form
    pub fn to_param(&self) -> String {
        match self {
            Self::Latest => "latest".to_string(),
            Self::Number(n) => format!("0x{:x}", n),
        }
    }
}

/// Event log as returned inside a receipt
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Log {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
}

/// Transaction receipt, reduced to what the log matcher reads
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub logs: Vec<Log>,
}

/// Block header with transaction hashes (`includeTx = false`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub transactions: Vec<String>,
}

/// Read-only chain capability injected into the evaluation
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// `eth_getCode`
    async fn get_code(&self, address: Address, block: BlockTag) -> AppResult<Bytes>;

    /// `eth_blockNumber`
    async fn get_latest_block_number(&self) -> AppResult<u64>;

    /// `eth_getBlockByNumber(number, false)`
    async fn get_block(&self, number: u64) -> AppResult<Option<Block>>;

    /// `eth_getTransactionReceipt`
    async fn get_transaction_receipt(&self, tx_hash: &str) -> AppResult<Option<Receipt>>;

    /// `eth_getBlockReceipts`
    async fn get_block_receipts(&self, number: u64) -> AppResult<Vec<Receipt>>;
}

/// Parse a hex quantity such as `0x1b4`
pub fn parse_quantity(value: &str) -> AppResult<u64> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| AppError::rpc_invalid_response(format!("Not a hex quantity: {}", value)))?;
    if digits.is_empty() {
        return Err(AppError::rpc_invalid_response("Empty hex quantity"));
    }
    u64::from_str_radix(digits, 16)
        .map_err(|e| AppError::rpc_invalid_response(format!("Bad quantity {}: {}", value, e)))
}

/// Parse hex data such as bytecode or log data; `0x` is empty
pub fn parse_hex_bytes(value: &str) -> AppResult<Bytes> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(digits)
        .map(Bytes::from)
        .map_err(|e| AppError::rpc_invalid_response(format!("Bad hex data: {}", e)))
}
