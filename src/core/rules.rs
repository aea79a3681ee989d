//! Risk Rules Module
//!
//! Turns the recipient classification and the gathered signals into an
//! ordered checklist plus one overall severity.
//!
//! The decision table is keyed by classification, then (for proxy wallets
//! only) by account key, network key and token kind. Each cell is an
//! ordered list of message keys; every message key maps to one fixed
//! `(icon, class, text)` row. The worst row decides the master status line,
//! which is always prepended.

use std::collections::HashMap;

use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::{
    Finding, MatchKey, RecipientClassification, Severity, SeverityClass, Signals, TokenKind,
    Verdict,
};

pub use crate::models::types::MessageKey;

impl MessageKey {
    /// Fixed `(icon, class, text)` for a row.
    ///
    /// The master status row has no fixed text; see [`master_row`].
    pub fn row(&self) -> (&'static str, SeverityClass, &'static str) {
        use SeverityClass::*;
        match self {
            Self::MasterStatus => master_row(Default),
            Self::RecipientZeroSend => ("i", Default, "This transaction does not move any funds."),
            Self::RecipientPolymarket => (
                "CHECK",
                Success,
                "Recipient is a Polymarket deposit wallet.",
            ),
            Self::RecipientWallet => (
                "!",
                Warning,
                "Recipient is a regular account, not a Polymarket deposit wallet.",
            ),
            Self::RecipientUnrecognized => (
                "X",
                Error,
                "Recipient is a contract this checker does not recognise. Do not sign and contact support.",
            ),
            Self::AccountMatched => (
                "CHECK",
                Success,
                "The deposit wallet was deployed by your account.",
            ),
            Self::AccountMismatched => (
                "X",
                Error,
                "The deposit wallet was deployed by a different account. Funds sent here will not reach your Polymarket balance.",
            ),
            Self::AccountUnknown => (
                "!",
                Warning,
                "Could not confirm which account deployed the deposit wallet.",
            ),
            Self::NetworkCorrect => ("CHECK", Success, "Transaction is on Polygon mainnet."),
            Self::NetworkIncorrect => (
                "X",
                Error,
                "Transaction is not on Polygon mainnet. Polymarket only credits deposits made on Polygon.",
            ),
            Self::NetworkUnknown => ("!", Warning, "Could not determine the network of this transaction."),
            Self::TokenUsdce => ("CHECK", Success, "Token is USDC.e, the token Polymarket accepts."),
            Self::TokenUsdc => (
                "!",
                Warning,
                "Token is native USDC. Polymarket balances are held in USDC.e and this deposit may need converting.",
            ),
            Self::TokenIncorrect => (
                "X",
                Error,
                "Token is neither USDC nor USDC.e. Polymarket will not credit this deposit.",
            ),
            Self::ChecksIncomplete => (
                "X",
                Error,
                "Some checks could not be completed. Review the audit details before signing.",
            ),
        }
    }
}

/// Master status row for the worst class found
pub fn master_row(class: SeverityClass) -> (&'static str, SeverityClass, &'static str) {
    match class {
        SeverityClass::Default => ("i", class, "No risks found."),
        SeverityClass::Success => ("CHECK", class, "Safe: all deposit checks passed."),
        SeverityClass::Warning => ("!", class, "Caution: review the findings below before signing."),
        SeverityClass::Error => ("X", class, "Danger: do not sign this transaction."),
    }
}

fn finding(key: MessageKey) -> Finding {
    let (icon_key, severity_class, message) = key.row();
    Finding {
        key,
        icon_key,
        severity_class,
        message,
    }
}

// ============================================
// Decision table
// ============================================

/// Table lookup key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionKey {
    ZeroSend,
    Unknown,
    Unreachable,
    Polymarket {
        account: MatchKey,
        network: MatchKey,
        token: TokenKind,
    },
}

impl DecisionKey {
    pub fn new(classification: RecipientClassification, signals: &Signals) -> Self {
        match classification {
            RecipientClassification::ZeroSend => Self::ZeroSend,
            RecipientClassification::Unknown => Self::Unknown,
            RecipientClassification::UnreachableRecipientType => Self::Unreachable,
            RecipientClassification::Polymarket => Self::Polymarket {
                account: signals.account,
                network: signals.network,
                token: signals.token,
            },
        }
    }

    /// Every key a complete table must cover
    pub fn all() -> Vec<Self> {
        let mut keys = vec![Self::ZeroSend, Self::Unknown, Self::Unreachable];
        for account in MatchKey::ALL {
            for network in MatchKey::ALL {
                for token in TokenKind::ALL {
                    keys.push(Self::Polymarket {
                        account,
                        network,
                        token,
                    });
                }
            }
        }
        keys
    }
}

/// Decision table: key → ordered message keys
#[derive(Debug, Clone)]
pub struct DecisionTable {
    entries: HashMap<DecisionKey, Vec<MessageKey>>,
    /// Used for keys missing from a partial table
    fallback: Vec<MessageKey>,
}

impl DecisionTable {
    /// Build a table that must cover every [`DecisionKey`].
    pub fn strict(entries: HashMap<DecisionKey, Vec<MessageKey>>) -> AppResult<Self> {
        let missing: Vec<_> = DecisionKey::all()
            .into_iter()
            .filter(|key| !entries.contains_key(key))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::new(
                ErrorCode::ConfigDecisionTable,
                format!("Decision table is missing {} entries: {:?}", missing.len(), missing),
            ));
        }
        Self::partial(entries, vec![MessageKey::RecipientWallet])
    }

    /// Build a table where missing keys resolve to `fallback`.
    pub fn partial(
        entries: HashMap<DecisionKey, Vec<MessageKey>>,
        fallback: Vec<MessageKey>,
    ) -> AppResult<Self> {
        let empty = entries
            .iter()
            .find(|(_, keys)| keys.is_empty() || keys.contains(&MessageKey::MasterStatus));
        if let Some((key, _)) = empty {
            return Err(AppError::new(
                ErrorCode::ConfigDecisionTable,
                format!("Decision table entry {:?} is empty or lists the master status", key),
            ));
        }
        if fallback.is_empty() {
            return Err(AppError::new(
                ErrorCode::ConfigDecisionTable,
                "Decision table fallback is empty",
            ));
        }
        Ok(Self { entries, fallback })
    }

    /// The Polymarket deposit rules
    pub fn standard() -> AppResult<Self> {
        let mut entries = HashMap::new();
        entries.insert(DecisionKey::ZeroSend, vec![MessageKey::RecipientZeroSend]);
        entries.insert(DecisionKey::Unknown, vec![MessageKey::RecipientWallet]);
        entries.insert(DecisionKey::Unreachable, vec![MessageKey::RecipientUnrecognized]);

        for account in MatchKey::ALL {
            for network in MatchKey::ALL {
                for token in TokenKind::ALL {
                    let rows = vec![
                        MessageKey::RecipientPolymarket,
                        match account {
                            MatchKey::Matched => MessageKey::AccountMatched,
                            MatchKey::Mismatched => MessageKey::AccountMismatched,
                            MatchKey::Unknown => MessageKey::AccountUnknown,
                        },
                        match network {
                            MatchKey::Matched => MessageKey::NetworkCorrect,
                            MatchKey::Mismatched => MessageKey::NetworkIncorrect,
                            MatchKey::Unknown => MessageKey::NetworkUnknown,
                        },
                        match token {
                            TokenKind::UsdcE => MessageKey::TokenUsdce,
                            TokenKind::Usdc => MessageKey::TokenUsdc,
                            TokenKind::Incorrect => MessageKey::TokenIncorrect,
                        },
                    ];
                    entries.insert(
                        DecisionKey::Polymarket {
                            account,
                            network,
                            token,
                        },
                        rows,
                    );
                }
            }
        }

        Self::strict(entries)
    }

    pub fn lookup(&self, key: &DecisionKey) -> &[MessageKey] {
        self.entries
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&self.fallback)
    }
}

// ============================================
// Engine
// ============================================

/// Pure rule evaluation
#[derive(Debug, Clone)]
pub struct RiskRuleEngine {
    table: DecisionTable,
}

impl RiskRuleEngine {
    pub fn new(table: DecisionTable) -> Self {
        Self { table }
    }

    pub fn standard() -> AppResult<Self> {
        Ok(Self::new(DecisionTable::standard()?))
    }

    /// Verdict for a fully gathered set of signals
    pub fn evaluate(&self, classification: RecipientClassification, signals: &Signals) -> Verdict {
        let key = DecisionKey::new(classification, signals);
        assemble(self.table.lookup(&key).to_vec())
    }

    /// Verdict when signal gathering stopped early. Whatever was learned is
    /// still evaluated and a `ChecksIncomplete` row is appended.
    pub fn evaluate_incomplete(
        &self,
        classification: Option<RecipientClassification>,
        signals: &Signals,
    ) -> Verdict {
        let mut keys = classification
            .map(|c| self.table.lookup(&DecisionKey::new(c, signals)).to_vec())
            .unwrap_or_default();
        keys.push(MessageKey::ChecksIncomplete);
        assemble(keys)
    }
}

/// Resolve rows, reduce to the worst class and prepend the master line.
fn assemble(keys: Vec<MessageKey>) -> Verdict {
    let rows: Vec<Finding> = keys.into_iter().map(finding).collect();

    // no rows: the master line stays at the identity (default, priority 0)
    let worst = rows
        .iter()
        .map(|f| f.severity_class)
        .fold(None::<SeverityClass>, |acc, class| match acc {
            Some(best) if best.priority() >= class.priority() => Some(best),
            _ => Some(class),
        })
        .unwrap_or(SeverityClass::Default);

    let (icon_key, severity_class, message) = master_row(worst);
    let mut findings = Vec::with_capacity(rows.len() + 1);
    findings.push(Finding {
        key: MessageKey::MasterStatus,
        icon_key,
        severity_class,
        message,
    });
    findings.extend(rows);

    Verdict {
        findings,
        severity: Severity::from_priority(worst.priority()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(account: MatchKey, network: MatchKey, token: TokenKind) -> Signals {
        Signals {
            account,
            network,
            token,
        }
    }

    #[test]
    fn test_standard_table_is_complete() {
        let table = DecisionTable::standard().unwrap();
        for key in DecisionKey::all() {
            assert!(table.entries.contains_key(&key), "missing {:?}", key);
        }
        assert_eq!(DecisionKey::all().len(), 3 + 27);
    }

    #[test]
    fn test_strict_rejects_missing_entries() {
        let mut entries = HashMap::new();
        entries.insert(DecisionKey::ZeroSend, vec![MessageKey::RecipientZeroSend]);
        let err = DecisionTable::strict(entries).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigDecisionTable);
    }

    #[test]
    fn test_partial_uses_fallback() {
        let table = DecisionTable::partial(HashMap::new(), vec![MessageKey::RecipientWallet]).unwrap();
        assert_eq!(table.lookup(&DecisionKey::Unreachable), &[MessageKey::RecipientWallet]);
    }

    #[test]
    fn test_partial_rejects_master_in_entry() {
        let mut entries = HashMap::new();
        entries.insert(DecisionKey::ZeroSend, vec![MessageKey::MasterStatus]);
        assert!(DecisionTable::partial(entries, vec![MessageKey::RecipientWallet]).is_err());
    }

    #[test]
    fn test_safe_deposit() {
        let engine = RiskRuleEngine::standard().unwrap();
        let verdict = engine.evaluate(
            RecipientClassification::Polymarket,
            &signals(MatchKey::Matched, MatchKey::Matched, TokenKind::UsdcE),
        );
        assert_eq!(verdict.severity, Severity::Safe);
        assert_eq!(verdict.master().unwrap().key, MessageKey::MasterStatus);
        assert_eq!(verdict.master().unwrap().severity_class, SeverityClass::Success);
        assert!(verdict.contains(MessageKey::AccountMatched));
        assert!(verdict.contains(MessageKey::NetworkCorrect));
        assert!(verdict.contains(MessageKey::TokenUsdce));
    }

    #[test]
    fn test_wrong_network_is_critical() {
        let engine = RiskRuleEngine::standard().unwrap();
        let verdict = engine.evaluate(
            RecipientClassification::Polymarket,
            &signals(MatchKey::Matched, MatchKey::Mismatched, TokenKind::UsdcE),
        );
        assert_eq!(verdict.severity, Severity::Critical);
        assert_eq!(verdict.master().unwrap().severity_class, SeverityClass::Error);
    }

    #[test]
    fn test_missing_evidence_is_caution() {
        let engine = RiskRuleEngine::standard().unwrap();
        let verdict = engine.evaluate(
            RecipientClassification::Polymarket,
            &signals(MatchKey::Unknown, MatchKey::Matched, TokenKind::UsdcE),
        );
        assert_eq!(verdict.severity, Severity::Caution);
        assert!(verdict.contains(MessageKey::AccountUnknown));
    }

    #[test]
    fn test_zero_send_never_errors() {
        let engine = RiskRuleEngine::standard().unwrap();
        let verdict = engine.evaluate(RecipientClassification::ZeroSend, &Signals::default());
        assert_eq!(verdict.severity, Severity::Safe);
        assert_eq!(verdict.master().unwrap().severity_class.priority(), 0);
        assert_eq!(verdict.findings.len(), 2);
    }

    #[test]
    fn test_unrecognized_contract() {
        let engine = RiskRuleEngine::standard().unwrap();
        let verdict = engine.evaluate(
            RecipientClassification::UnreachableRecipientType,
            &Signals::default(),
        );
        assert_eq!(verdict.severity, Severity::Critical);
        assert!(verdict.findings[1].message.contains("contact support"));
    }

    #[test]
    fn test_incomplete_keeps_partial_rows() {
        let engine = RiskRuleEngine::standard().unwrap();
        let verdict = engine.evaluate_incomplete(
            Some(RecipientClassification::Polymarket),
            &signals(MatchKey::Unknown, MatchKey::Matched, TokenKind::UsdcE),
        );
        assert_eq!(verdict.severity, Severity::Critical);
        assert!(verdict.contains(MessageKey::RecipientPolymarket));
        assert_eq!(verdict.findings.last().unwrap().key, MessageKey::ChecksIncomplete);

        let verdict = engine.evaluate_incomplete(None, &Signals::default());
        assert_eq!(verdict.findings.len(), 2);
        assert_eq!(verdict.severity, Severity::Critical);
    }

    #[test]
    fn test_master_is_first_max() {
        let verdict = assemble(vec![]);
        assert_eq!(verdict.findings.len(), 1);
        assert_eq!(verdict.severity, Severity::Safe);
        assert_eq!(verdict.findings[0].severity_class, SeverityClass::Default);

        let verdict = assemble(vec![MessageKey::RecipientZeroSend, MessageKey::NetworkCorrect]);
        assert_eq!(verdict.findings[0].severity_class, SeverityClass::Default);
    }
}
