//! RPC Client Module - JSON-RPC 2.0 over HTTP
//!
//! 1. One endpoint per provider (configured in models/config.rs)
//! 2. Bounded exponential backoff with jitter for transport failures
//! 3. RPC-level `error` fields surface immediately as `RpcError`
//! 4. Gzip compression for large receipt payloads
//!
//! Uses constants from utils/constants.rs

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, USER_AGENT};
use serde::{de::DeserializeOwned, Deserialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::config::GuardConfig;
use crate::models::errors::{AppError, AppResult, RpcError};
use crate::providers::chain::{
    parse_hex_bytes, parse_quantity, Block, BlockTag, ChainClient, Receipt,
};
use crate::utils::checksum::checksum_address;
use crate::utils::constants::{
    BASE_RETRY_MS, MAX_RETRY_MS, RETRY_JITTER_PERCENT, USER_AGENT as USER_AGENT_CONST,
};

/// JSON-RPC provider with retry logic
#[derive(Clone)]
pub struct RpcProvider {
    url: String,
    /// HTTP client with custom headers (gzip enabled)
    client: reqwest::Client,
    max_retries: u32,
    next_id: Arc<AtomicU64>,
}

impl RpcProvider {
    /// Create a provider from the runtime configuration
    pub fn new(config: &GuardConfig) -> AppResult<Self> {
        Self::with_endpoint(&config.rpc_url, config.rpc_timeout, config.rpc_max_retries)
    }

    pub fn with_endpoint(url: &str, timeout: Duration, max_retries: u32) -> AppResult<Self> {
        if url.is_empty() {
            return Err(AppError::invalid_config("RPC URL is empty"));
        }

        Ok(Self {
            url: url.to_string(),
            client: Self::build_client(timeout)?,
            max_retries: max_retries.max(1),
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// Build HTTP client with custom headers
    fn build_client(timeout: Duration) -> AppResult<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| AppError::invalid_config(format!("Failed to build HTTP client: {}", e)))
    }

    /// Get RPC URL (masked for logging)
    pub fn masked_url(&self) -> String {
        if let Some((base, _key)) = self.url.split_once("/v2/") {
            return format!("{}/v2/***HIDDEN***", base);
        }
        self.url.clone()
    }

    /// Execute a call whose result must be present
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> AppResult<T> {
        self.call_optional(method, params)
            .await?
            .ok_or_else(|| AppError::rpc_invalid_response(format!("No result for {}", method)))
    }

    /// Execute a call whose result may be `null`
    pub async fn call_optional<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> AppResult<Option<T>> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
        });

        let mut attempt = 0;
        loop {
            match self.execute_call::<T>(&payload).await {
                Ok(result) => return Ok(result),
                Err(e) if e.code.is_retryable() && attempt + 1 < self.max_retries => {
                    let delay = backoff_delay(attempt);
                    warn!(
                        method,
                        attempt = attempt + 1,
                        max = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "⏳ Retrying RPC call: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Execute single RPC call
    async fn execute_call<T: DeserializeOwned>(
        &self,
        payload: &serde_json::Value,
    ) -> AppResult<Option<T>> {
        debug!(method = %payload["method"], params = %payload["params"], "→ RPC");

        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::rpc_timeout(format!("Request timed out: {}", e))
                } else {
                    AppError::rpc_connection_failed(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        if status == 429 {
            return Err(AppError::rpc_rate_limited());
        }
        if !status.is_success() {
            return Err(AppError::rpc_connection_failed(format!("HTTP error: {}", status)));
        }

        let json: RpcResponse<T> = response.json().await.map_err(|e| {
            AppError::rpc_invalid_response(format!("Failed to parse response: {}", e))
        })?;

        if let Some(error) = json.error {
            if error.is_rate_limit() {
                return Err(AppError::rpc_rate_limited());
            }
            return Err(AppError::rpc_error(error));
        }

        Ok(json.result)
    }
}

/// Exponential backoff with ±jitter, capped
fn backoff_delay(attempt: u32) -> Duration {
    let base_delay = BASE_RETRY_MS.saturating_mul(2_u64.saturating_pow(attempt));
    let capped_delay = base_delay.min(MAX_RETRY_MS);

    let jitter_range = (capped_delay * RETRY_JITTER_PERCENT) / 100;
    let jitter: i64 =
        rand::thread_rng().gen_range(-(jitter_range as i64)..=(jitter_range as i64));
    Duration::from_millis((capped_delay as i64 + jitter).max(50) as u64)
}

#[async_trait]
impl ChainClient for RpcProvider {
    async fn get_code(&self, address: Address, block: BlockTag) -> AppResult<Bytes> {
        let params = serde_json::json!([checksum_address(&address), block.to_param()]);
        let code: String = self.call("eth_getCode", params).await?;
        parse_hex_bytes(&code)
    }

    async fn get_latest_block_number(&self) -> AppResult<u64> {
        let latest: String = self.call("eth_blockNumber", serde_json::json!([])).await?;
        parse_quantity(&latest)
    }

    async fn get_block(&self, number: u64) -> AppResult<Option<Block>> {
        let params = serde_json::json!([BlockTag::Number(number).to_param(), false]);
        self.call_optional("eth_getBlockByNumber", params).await
    }

    async fn get_transaction_receipt(&self, tx_hash: &str) -> AppResult<Option<Receipt>> {
        self.call_optional("eth_getTransactionReceipt", serde_json::json!([tx_hash]))
            .await
    }

    async fn get_block_receipts(&self, number: u64) -> AppResult<Vec<Receipt>> {
        let params = serde_json::json!([BlockTag::Number(number).to_param()]);
        // null means the node has no receipts for a block it should know
        self.call("eth_getBlockReceipts", params).await
    }
}

/// JSON-RPC response structure
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}
