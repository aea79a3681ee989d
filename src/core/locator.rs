//! Creation block search
//!
//! Binary search over historical state for the first block at which an
//! address has code. Assumes code, once present, stays present; the
//! transition is never re-checked. Needs a node that serves state at
//! arbitrary heights (archive node).

use alloy_primitives::Address;
use tracing::debug;

use crate::models::errors::AppResult;
use crate::providers::chain::{BlockTag, ChainClient};
use crate::utils::checksum::checksum_address;

pub struct CreationBlockLocator;

impl CreationBlockLocator {
    /// First block with non-empty code at `address`, searching `[0, latest]`.
    pub async fn locate<C: ChainClient + ?Sized>(client: &C, address: Address) -> AppResult<u64> {
        let latest = client.get_latest_block_number().await?;
        Self::locate_below(client, address, latest).await
    }

    /// Same search with a caller-supplied upper bound.
    /// Uses at most `ceil(log2(high + 1))` code queries.
    pub async fn locate_below<C: ChainClient + ?Sized>(
        client: &C,
        address: Address,
        high: u64,
    ) -> AppResult<u64> {
        let (mut low, mut high) = (0u64, high);
        let mut probes = 0u32;

        while low < high {
            let mid = low + (high - low) / 2;
            let code = client.get_code(address, BlockTag::Number(mid)).await?;
            probes += 1;
            if code.is_empty() {
                low = mid + 1;
            } else {
                high = mid;
            }
        }

        debug!(
            address = %checksum_address(&address),
            block = low,
            probes,
            "Located creation block"
        );
        Ok(low)
    }
}
