//! Transfer decoder module
//! Recovers the real recipient and amount from a pending transaction

use alloy_primitives::{Address, U256};
use alloy_sol_types::{sol, SolCall};
use tracing::debug;

use crate::models::errors::{AppError, AppResult};
use crate::models::types::{Transaction, TransferIntent};

sol! {
    function transfer(address to, uint256 amount) external returns (bool);
}

/// Byte offset of the recipient inside `transfer(address,uint256)` calldata
/// (4-byte selector + 12 bytes of left padding)
const RECIPIENT_OFFSET: usize = 16;
/// Shortest calldata that holds a selector and two 32-byte words
const MIN_TRANSFER_CALLDATA: usize = 4 + 32 + 32;

/// Transfer shapes the decoder understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferShape {
    /// Plain value transfer, no calldata
    Native,
    /// ERC-20 style `transfer(address,uint256)` payload
    Erc20Transfer,
}

/// Decoder for value-moving transactions
pub struct TransferDecoder;

impl TransferDecoder {
    /// Pick the shape from the calldata
    pub fn shape(tx: &Transaction) -> TransferShape {
        if tx.data.is_empty() {
            TransferShape::Native
        } else {
            TransferShape::Erc20Transfer
        }
    }

    /// Decode recipient and amount
    pub fn decode(tx: &Transaction) -> AppResult<TransferIntent> {
        match Self::shape(tx) {
            TransferShape::Native => Ok(TransferIntent {
                recipient: tx.to,
                amount: tx.value,
                is_native: true,
            }),
            TransferShape::Erc20Transfer => Self::decode_erc20_transfer(&tx.data),
        }
    }

    /// Fixed-offset decoding: recipient from the low 20 bytes of the first
    /// argument word, amount from the trailing 32 bytes. The selector is not
    /// validated.
    fn decode_erc20_transfer(data: &[u8]) -> AppResult<TransferIntent> {
        if data.len() < MIN_TRANSFER_CALLDATA {
            return Err(AppError::malformed_tx_data(format!(
                "Calldata is {} bytes, expected at least {}",
                data.len(),
                MIN_TRANSFER_CALLDATA
            )));
        }

        if data[..4] != transferCall::SELECTOR {
            debug!(selector = %hex::encode(&data[..4]), "Calldata is not a transfer() call");
        }

        let recipient = Address::from_slice(&data[RECIPIENT_OFFSET..RECIPIENT_OFFSET + 20]);
        let amount = U256::from_be_slice(&data[data.len() - 32..]);

        Ok(TransferIntent {
            recipient,
            amount,
            is_native: false,
        })
    }
}
