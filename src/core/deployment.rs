//! Deployment log matching
//!
//! Scans every receipt of the wallet's creation block for the deployment
//! event and decodes who the wallet was deployed for (`to`) and by whom
//! (`by`). The first match wins: receipts in block order, then logs in
//! receipt order.

use alloy_primitives::Address;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::config::ReceiptsMode;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::DeploymentEvidence;
use crate::providers::chain::{parse_hex_bytes, ChainClient, Log, Receipt};
use crate::utils::constants::RECEIPT_FETCH_CONCURRENCY;

/// Matched log together with where it was found
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentLog {
    #[serde(flatten)]
    pub evidence: DeploymentEvidence,
    pub transaction_hash: Option<String>,
    pub log: Log,
}

pub struct DeploymentLogMatcher {
    topic: String,
    mode: ReceiptsMode,
}

impl DeploymentLogMatcher {
    pub fn new(topic: &str, mode: ReceiptsMode) -> Self {
        Self {
            topic: topic.to_ascii_lowercase(),
            mode,
        }
    }

    /// Find the deployment log in `block`. `None` is a normal outcome.
    pub async fn find<C: ChainClient + ?Sized>(
        &self,
        client: &C,
        block: u64,
    ) -> AppResult<Option<DeploymentLog>> {
        let receipts = self.fetch_receipts(client, block).await?;
        debug!(block, receipts = receipts.len(), "Scanning receipts for deployment log");

        for receipt in receipts {
            let matched = receipt.logs.iter().find(|log| {
                log.topics
                    .first()
                    .map(|t| t.eq_ignore_ascii_case(&self.topic))
                    .unwrap_or(false)
            });

            if let Some(log) = matched {
                let (emitted_to, emitted_by) = decode_deployment_data(&log.data)?;
                return Ok(Some(DeploymentLog {
                    evidence: DeploymentEvidence {
                        block_number: block,
                        emitted_to,
                        emitted_by,
                    },
                    transaction_hash: receipt.transaction_hash.clone(),
                    log: log.clone(),
                }));
            }
        }

        debug!(block, "No deployment log in block");
        Ok(None)
    }

    async fn fetch_receipts<C: ChainClient + ?Sized>(
        &self,
        client: &C,
        block: u64,
    ) -> AppResult<Vec<Receipt>> {
        match self.mode {
            ReceiptsMode::BlockReceipts => client.get_block_receipts(block).await,
            ReceiptsMode::PerTransaction => per_transaction_receipts(client, block).await,
            ReceiptsMode::Auto => match client.get_block_receipts(block).await {
                Err(e) if e.is_method_not_found() => {
                    warn!(block, "eth_getBlockReceipts unsupported, fetching receipts per transaction");
                    per_transaction_receipts(client, block).await
                }
                other => other,
            },
        }
    }
}

/// Block's transaction hashes, then their receipts with bounded concurrency.
/// Output keeps block order. The block is known to exist, so a missing
/// receipt is a node fault, not an absent log.
async fn per_transaction_receipts<C: ChainClient + ?Sized>(
    client: &C,
    block: u64,
) -> AppResult<Vec<Receipt>> {
    let header = client
        .get_block(block)
        .await?
        .ok_or_else(|| AppError::rpc_invalid_response(format!("Block {} not found", block)))?;

    let receipts: Vec<Option<Receipt>> = stream::iter(header.transactions.iter().cloned())
        .map(|hash| async move { client.get_transaction_receipt(&hash).await })
        .buffered(RECEIPT_FETCH_CONCURRENCY)
        .try_collect()
        .await?;

    require_receipts(&header.transactions, receipts)
}

fn require_receipts(hashes: &[String], receipts: Vec<Option<Receipt>>) -> AppResult<Vec<Receipt>> {
    hashes
        .iter()
        .zip(receipts)
        .map(|(hash, receipt)| {
            receipt.ok_or_else(|| {
                AppError::rpc_invalid_response(format!("Receipt {} missing", hash))
            })
        })
        .collect()
}

/// `to` sits in the low 20 bytes of the first data word, `by` in the second.
fn decode_deployment_data(data: &str) -> AppResult<(Address, Address)> {
    let bytes = parse_hex_bytes(data)?;
    if bytes.len() < 64 {
        return Err(AppError::rpc_invalid_response(format!(
            "Deployment log data is {} bytes, expected at least 64",
            bytes.len()
        )));
    }
    let to = Address::from_slice(&bytes[12..32]);
    let by = Address::from_slice(&bytes[44..64]);
    Ok((to, by))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_decode_deployment_data() {
        let data = concat!(
            "0x",
            "000000000000000000000000aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            "000000000000000000000000bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb",
        );
        let (to, by) = decode_deployment_data(data).unwrap();
        assert_eq!(to, address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"));
        assert_eq!(by, address!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"));
    }

    #[test]
    fn test_missing_receipt_is_an_error() {
        let hashes = vec!["0x01".to_string(), "0x02".to_string()];
        let err = require_receipts(&hashes, vec![Some(Receipt::default()), None]).unwrap_err();
        assert_eq!(err.code, crate::models::errors::ErrorCode::RpcInvalidResponse);
        assert!(err.message.contains("0x02"));

        let ok = require_receipts(&hashes, vec![Some(Receipt::default()), Some(Receipt::default())])
            .unwrap();
        assert_eq!(ok.len(), 2);
    }

    #[test]
    fn test_short_log_data_rejected() {
        let err = decode_deployment_data("0x00").unwrap_err();
        assert_eq!(err.code, crate::models::errors::ErrorCode::RpcInvalidResponse);
    }
}
