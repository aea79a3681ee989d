//! Recipient resolution
//! The `to` field of a token transfer is the token contract, not the payee.

use tracing::debug;

use crate::models::errors::AppResult;
use crate::models::types::{Transaction, TransferIntent};
use crate::utils::checksum::checksum_address;
use crate::utils::decoder::TransferDecoder;

pub struct RecipientResolver;

impl RecipientResolver {
    /// Recover who really receives funds and how much
    pub fn resolve(tx: &Transaction) -> AppResult<TransferIntent> {
        let intent = TransferDecoder::decode(tx)?;
        debug!(
            recipient = %checksum_address(&intent.recipient),
            amount = %intent.amount,
            native = intent.is_native,
            "Resolved transfer intent"
        );
        Ok(intent)
    }
}
