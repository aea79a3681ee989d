//! Contract identification by bytecode comparison

use alloy_primitives::Bytes;
use tracing::debug;

use crate::models::errors::AppResult;
use crate::models::types::{RecipientClassification, TransferIntent};
use crate::providers::chain::{BlockTag, ChainClient};
use crate::utils::checksum::checksum_address;

pub struct ContractIdentifier;

impl ContractIdentifier {
    /// Fetch the recipient's current code and classify it.
    /// Returns the classification together with the code that was seen.
    pub async fn identify<C: ChainClient + ?Sized>(
        client: &C,
        intent: &TransferIntent,
        template: &Bytes,
    ) -> AppResult<(RecipientClassification, Bytes)> {
        let code = client.get_code(intent.recipient, BlockTag::Latest).await?;
        let classification = Self::classify(intent, &code, template);
        debug!(
            recipient = %checksum_address(&intent.recipient),
            code_len = code.len(),
            classification = classification.as_str(),
            "Identified recipient"
        );
        Ok((classification, code))
    }

    /// Classification policy, first match wins:
    /// zero amount, template code, no code, anything else.
    pub fn classify(
        intent: &TransferIntent,
        code: &Bytes,
        template: &Bytes,
    ) -> RecipientClassification {
        if intent.amount.is_zero() {
            RecipientClassification::ZeroSend
        } else if code == template {
            RecipientClassification::Polymarket
        } else if code.is_empty() {
            RecipientClassification::Unknown
        } else {
            RecipientClassification::UnreachableRecipientType
        }
    }
}
