//! Configuration module for the deposit sentry
//!
//! Uses constants from utils/constants.rs. No hardcoded addresses or
//! endpoints in this file.

use alloy_primitives::{Address, Bytes};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::models::errors::{AppError, AppResult};
use crate::utils::checksum::parse_address;
use crate::utils::constants::{
    build_alchemy_url, get_public_rpc_fallback, CHAIN_ID_POLYGON, DEFAULT_EVAL_TIMEOUT_SECS,
    DEFAULT_RPC_MAX_RETRIES, DEFAULT_RPC_TIMEOUT_SECS, DEPLOYMENT_EVENT_TOPIC, EXPECTED_CHAIN,
    PROXY_WALLET_BYTECODE, USDCE_ADDRESS, USDC_ADDRESS,
};

/// How a block's receipts are fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptsMode {
    /// One `eth_getBlockReceipts` call
    BlockReceipts,
    /// `eth_getBlockByNumber` then one `eth_getTransactionReceipt` per tx
    PerTransaction,
    /// Block receipts, falling back to per-tx when the node lacks the method
    Auto,
}

impl FromStr for ReceiptsMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "block" => Ok(Self::BlockReceipts),
            "per-tx" | "per_tx" => Ok(Self::PerTransaction),
            "auto" => Ok(Self::Auto),
            other => Err(AppError::invalid_config(format!(
                "Unknown receipts mode: {}",
                other
            ))),
        }
    }
}

/// What counts as a valid deposit
#[derive(Debug, Clone)]
pub struct DepositPolicy {
    /// Runtime code of the proxy wallet template
    pub proxy_wallet_code: Bytes,
    /// First topic of the deployment log
    pub deployment_topic: String,
    pub usdce: Address,
    pub usdc: Address,
    /// CAIP-2 chain the deposit must be sent on
    pub expected_chain: String,
}

impl DepositPolicy {
    /// Polymarket on Polygon mainnet
    pub fn polymarket() -> AppResult<Self> {
        let proxy_wallet_code = hex::decode(PROXY_WALLET_BYTECODE.trim_start_matches("0x"))
            .map(Bytes::from)
            .map_err(|e| AppError::invalid_config(format!("Bad proxy wallet bytecode: {}", e)))?;

        Ok(Self {
            proxy_wallet_code,
            deployment_topic: DEPLOYMENT_EVENT_TOPIC.to_ascii_lowercase(),
            usdce: parse_address(USDCE_ADDRESS)?,
            usdc: parse_address(USDC_ADDRESS)?,
            expected_chain: EXPECTED_CHAIN.to_string(),
        })
    }
}

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// HTTP JSON-RPC endpoint for Polygon
    pub rpc_url: String,
    /// Timeout for one RPC request
    pub rpc_timeout: Duration,
    /// Attempts for retryable RPC failures
    pub rpc_max_retries: u32,
    /// Deadline for a whole evaluation
    pub eval_timeout: Duration,
    pub receipts_mode: ReceiptsMode,
    pub policy: DepositPolicy,
}

impl GuardConfig {
    /// Load configuration from the environment.
    pub fn from_env() -> AppResult<Self> {
        let rpc_url = Self::resolve_rpc_url();

        let rpc_timeout = Duration::from_secs(env_parse(
            "SENTRY_RPC_TIMEOUT_SECS",
            DEFAULT_RPC_TIMEOUT_SECS,
        )?);
        let eval_timeout = Duration::from_secs(env_parse(
            "SENTRY_EVAL_TIMEOUT_SECS",
            DEFAULT_EVAL_TIMEOUT_SECS,
        )?);
        let rpc_max_retries = env_parse("SENTRY_RPC_MAX_RETRIES", DEFAULT_RPC_MAX_RETRIES)?;

        let receipts_mode = match std::env::var("SENTRY_RECEIPTS_MODE") {
            Ok(v) if !v.is_empty() => v.parse()?,
            _ => ReceiptsMode::Auto,
        };

        Ok(Self {
            rpc_url,
            rpc_timeout,
            rpc_max_retries: rpc_max_retries.max(1),
            eval_timeout,
            receipts_mode,
            policy: DepositPolicy::polymarket()?,
        })
    }

    /// Explicit URL, then Alchemy, then the public endpoint.
    /// The API key is never logged.
    fn resolve_rpc_url() -> String {
        if let Ok(url) = std::env::var("POLYGON_HTTP_URL") {
            if !url.is_empty() {
                info!("🔗 Using POLYGON_HTTP_URL");
                return url;
            }
        }

        if let Ok(key) = std::env::var("ALCHEMY_API_KEY") {
            if !key.is_empty() && key != "YOUR_API_KEY" {
                if let Some(url) = build_alchemy_url(CHAIN_ID_POLYGON, &key) {
                    info!("🔑 ALCHEMY_API_KEY configured (key hidden for security)");
                    return url;
                }
            }
        }

        info!("🌐 Using public Polygon RPC");
        get_public_rpc_fallback(CHAIN_ID_POLYGON)
            .unwrap_or_default()
            .to_string()
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> AppResult<T> {
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => v
            .parse()
            .map_err(|_| AppError::invalid_config(format!("{} has invalid value {:?}", key, v))),
        _ => Ok(default),
    }
}
