//! Type definitions for deposit evaluation
//! All values are built fresh for each transaction and never shared.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::errors::{AppError, AppResult};
use crate::utils::checksum::{parse_address, serialize_checksummed};

// ============================================
// Host input
// ============================================

/// Transaction fields exactly as the host hands them over
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTransaction {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub from: String,
}

/// Inbound request from the host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub transaction: RawTransaction,
    #[serde(default)]
    pub chain_id: String,
    #[serde(default)]
    pub transaction_origin: String,
}

/// Parsed, immutable pending transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub from: Address,
}

impl Transaction {
    /// Parse the host's string fields.
    ///
    /// Empty `value` means zero and empty `data` (or bare `0x`) means no
    /// calldata.
    pub fn parse(raw: &RawTransaction) -> AppResult<Self> {
        let to = parse_address(&raw.to)?;
        let from = parse_address(&raw.from)?;

        let value = match raw.value.trim() {
            "" => U256::ZERO,
            v => U256::from_str(v).map_err(|e| {
                AppError::malformed_tx_data(format!("Invalid value {:?}: {}", v, e))
            })?,
        };

        let hex_data = raw.data.trim();
        let hex_data = hex_data.strip_prefix("0x").unwrap_or(hex_data);
        let data = hex::decode(hex_data)
            .map(Bytes::from)
            .map_err(|e| AppError::malformed_tx_data(format!("Invalid calldata hex: {}", e)))?;

        Ok(Self { to, value, data, from })
    }
}

// ============================================
// Derived values
// ============================================

/// Who actually receives the funds, and how much
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferIntent {
    pub recipient: Address,
    pub amount: U256,
    pub is_native: bool,
}

/// What kind of account the recipient is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecipientClassification {
    /// Nothing is being transferred
    ZeroSend,
    /// Code matches the proxy wallet template
    Polymarket,
    /// No code at the address (externally-owned account)
    Unknown,
    /// A contract that is neither empty nor the template.
    /// Reaching this means the policy has a gap.
    UnreachableRecipientType,
}

impl RecipientClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZeroSend => "ZERO_SEND",
            Self::Polymarket => "POLYMARKET",
            Self::Unknown => "UNKNOWN",
            Self::UnreachableRecipientType => "UnreachableRecipientType",
        }
    }
}

/// Deployment log found in the wallet's creation block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentEvidence {
    pub block_number: u64,
    #[serde(serialize_with = "serialize_checksummed")]
    pub emitted_to: Address,
    #[serde(serialize_with = "serialize_checksummed")]
    pub emitted_by: Address,
}

/// Three-valued comparison outcome; `Unknown` when evidence is absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchKey {
    Matched,
    Mismatched,
    Unknown,
}

impl MatchKey {
    pub const ALL: [MatchKey; 3] = [Self::Matched, Self::Mismatched, Self::Unknown];

    pub fn from_option(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::Matched,
            Some(false) => Self::Mismatched,
            None => Self::Unknown,
        }
    }
}

/// Which accepted token (if any) the transaction moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    UsdcE,
    Usdc,
    Incorrect,
}

impl TokenKind {
    pub const ALL: [TokenKind; 3] = [Self::UsdcE, Self::Usdc, Self::Incorrect];

    /// First flag that is set wins; no flag set means the token is wrong.
    pub fn resolve(flags: &[(TokenKind, bool)]) -> Self {
        flags
            .iter()
            .find(|(_, set)| *set)
            .map(|(kind, _)| *kind)
            .unwrap_or(Self::Incorrect)
    }
}

/// Inputs to the rule engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signals {
    pub account: MatchKey,
    pub network: MatchKey,
    pub token: TokenKind,
}

impl Default for Signals {
    fn default() -> Self {
        Self {
            account: MatchKey::Unknown,
            network: MatchKey::Unknown,
            token: TokenKind::Incorrect,
        }
    }
}

// ============================================
// Verdict
// ============================================

/// Display class of a single finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityClass {
    Default,
    Success,
    Warning,
    Error,
}

impl SeverityClass {
    /// Numeric priority used for the max-reduction
    pub fn priority(&self) -> u8 {
        match self {
            Self::Default | Self::Success => 0,
            Self::Warning => 1,
            Self::Error => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Overall risk tier of a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Safe,
    Caution,
    Critical,
}

impl Severity {
    pub fn from_priority(priority: u8) -> Self {
        match priority {
            0 => Self::Safe,
            1 => Self::Caution,
            _ => Self::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Caution => "caution",
            Self::Critical => "critical",
        }
    }
}

/// Every row the checklist can show, declared in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKey {
    MasterStatus,
    RecipientZeroSend,
    RecipientPolymarket,
    RecipientWallet,
    RecipientUnrecognized,
    AccountMatched,
    AccountMismatched,
    AccountUnknown,
    NetworkCorrect,
    NetworkIncorrect,
    NetworkUnknown,
    TokenUsdce,
    TokenUsdc,
    TokenIncorrect,
    ChecksIncomplete,
}

impl MessageKey {
    /// Canonical display position
    pub fn rank(&self) -> u8 {
        *self as u8
    }
}

/// One checklist row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub key: MessageKey,
    pub icon_key: &'static str,
    pub severity_class: SeverityClass,
    pub message: &'static str,
}

/// Rule engine output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    /// Master status first, then the table-ordered checklist
    pub findings: Vec<Finding>,
    pub severity: Severity,
}

impl Verdict {
    pub fn master(&self) -> Option<&Finding> {
        self.findings.first()
    }

    pub fn contains(&self, key: MessageKey) -> bool {
        self.findings.iter().any(|f| f.key == key)
    }
}
