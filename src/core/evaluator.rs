//! Deposit evaluation pipeline
//!
//! Resolve the recipient, identify it, find its deployment log, run the
//! rules and render. Each call builds its own state; nothing is cached
//! between transactions.

use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy_primitives::{Bytes, U256};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use tokio::time::timeout;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::core::deployment::{DeploymentLog, DeploymentLogMatcher};
use crate::core::identifier::ContractIdentifier;
use crate::core::locator::CreationBlockLocator;
use crate::core::presenter::{InsightResponse, VerdictPresenter};
use crate::core::resolver::RecipientResolver;
use crate::core::rules::RiskRuleEngine;
use crate::models::config::{DepositPolicy, GuardConfig, ReceiptsMode};
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{
    MatchKey, RawTransaction, RecipientClassification, Signals, TokenKind, Transaction,
    TransactionRequest, Verdict,
};
use crate::providers::chain::ChainClient;
use crate::utils::checksum::checksum_address;
use crate::utils::constants::{get_chain_name, parse_caip2_chain_id};

/// Captured failure, shown in the audit section
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub code: &'static str,
    pub message: String,
}

impl From<&AppError> for ErrorRecord {
    fn from(e: &AppError) -> Self {
        Self {
            code: e.code_str(),
            message: e.to_string(),
        }
    }
}

/// Everything learned about one transaction
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub evaluation_id: String,
    pub evaluated_at: DateTime<Utc>,
    pub transaction: RawTransaction,
    pub chain_id: String,
    pub origin: String,
    pub right_network: MatchKey,
    pub usdce_token: bool,
    pub usdc_token: bool,
    pub native_token: Option<bool>,
    /// Calldata word the recipient was read from; `to` for native sends
    pub raw_recipient: Option<String>,
    pub actual_recipient: Option<String>,
    #[serde(serialize_with = "serialize_decimal")]
    pub amount: Option<U256>,
    pub code: Option<Bytes>,
    pub recipient_type: Option<RecipientClassification>,
    pub creation_block_number: Option<u64>,
    pub event_log: Option<DeploymentLog>,
    pub match_sender: Option<bool>,
    pub match_recipient: Option<bool>,
    pub error: Option<ErrorRecord>,
}

impl Evidence {
    fn new(request: &TransactionRequest, evaluation_id: Uuid) -> Self {
        Self {
            evaluation_id: evaluation_id.to_string(),
            evaluated_at: Utc::now(),
            transaction: request.transaction.clone(),
            chain_id: request.chain_id.clone(),
            origin: request.transaction_origin.clone(),
            right_network: MatchKey::Unknown,
            usdce_token: false,
            usdc_token: false,
            native_token: None,
            raw_recipient: None,
            actual_recipient: None,
            amount: None,
            code: None,
            recipient_type: None,
            creation_block_number: None,
            event_log: None,
            match_sender: None,
            match_recipient: None,
            error: None,
        }
    }
}

/// U256 as a decimal string
fn serialize_decimal<S: Serializer>(value: &Option<U256>, s: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => s.serialize_str(&v.to_string()),
        None => s.serialize_none(),
    }
}

/// Verdict plus the record it was derived from
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub evidence: Evidence,
    /// Signal gathering stopped early
    pub degraded: bool,
}

/// Rendered result with run metadata for the host
#[derive(Debug, Clone)]
pub struct InsightOutcome {
    pub response: InsightResponse,
    pub degraded: bool,
    pub latency_ms: u64,
}

/// Network signal from the host-reported CAIP-2 chain id
pub fn network_key(chain_id: &str, expected: &str) -> MatchKey {
    match chain_id.trim() {
        "" => MatchKey::Unknown,
        id if id == expected => MatchKey::Matched,
        _ => MatchKey::Mismatched,
    }
}

/// Transaction insight entry point
pub struct DepositGuard<C: ChainClient + ?Sized> {
    client: Arc<C>,
    policy: DepositPolicy,
    matcher: DeploymentLogMatcher,
    engine: RiskRuleEngine,
    eval_timeout: Duration,
}

impl<C: ChainClient + ?Sized> DepositGuard<C> {
    pub fn new(client: Arc<C>, config: &GuardConfig) -> AppResult<Self> {
        Self::with_policy(
            client,
            config.policy.clone(),
            config.receipts_mode,
            RiskRuleEngine::standard()?,
            config.eval_timeout,
        )
    }

    pub fn with_policy(
        client: Arc<C>,
        policy: DepositPolicy,
        receipts_mode: ReceiptsMode,
        engine: RiskRuleEngine,
        eval_timeout: Duration,
    ) -> AppResult<Self> {
        if eval_timeout.is_zero() {
            return Err(AppError::invalid_config("Evaluation timeout must be positive"));
        }
        let matcher = DeploymentLogMatcher::new(&policy.deployment_topic, receipts_mode);
        Ok(Self {
            client,
            policy,
            matcher,
            engine,
            eval_timeout,
        })
    }

    pub fn policy(&self) -> &DepositPolicy {
        &self.policy
    }

    /// Host hook: always answers with a renderable tree
    pub async fn on_transaction(&self, request: &TransactionRequest) -> InsightResponse {
        self.insight(request).await.response
    }

    /// Evaluate under the deadline and render
    pub async fn insight(&self, request: &TransactionRequest) -> InsightOutcome {
        let evaluation_id = Uuid::new_v4();
        let span = info_span!(
            "evaluation",
            id = %evaluation_id,
            origin = %request.transaction_origin,
        );

        async move {
            let started = Instant::now();
            let (response, degraded) =
                match timeout(self.eval_timeout, self.evaluate(request, evaluation_id)).await {
                    Ok(evaluation) => {
                        match VerdictPresenter::render(&evaluation.verdict, &evaluation.evidence) {
                            Ok(response) => (response, evaluation.degraded),
                            Err(e) => {
                                error!("❌ Render failed: {}", e);
                                (VerdictPresenter::render_error(&e), evaluation.degraded)
                            }
                        }
                    }
                    Err(_) => {
                        let e = AppError::evaluation_timeout(self.eval_timeout.as_secs());
                        warn!("⏱️ {}", e);
                        (VerdictPresenter::render_error(&e), true)
                    }
                };

            let latency_ms = started.elapsed().as_millis() as u64;
            info!(
                severity = response.severity.map(|s| s.as_str()).unwrap_or("none"),
                degraded,
                latency_ms,
                "✅ Evaluation complete"
            );

            InsightOutcome {
                response,
                degraded,
                latency_ms,
            }
        }
        .instrument(span)
        .await
    }

    /// Gather signals and run the rules. Failures degrade the verdict
    /// instead of aborting it.
    pub async fn evaluate(&self, request: &TransactionRequest, evaluation_id: Uuid) -> Evaluation {
        let mut evidence = Evidence::new(request, evaluation_id);
        let mut signals = Signals {
            network: network_key(&request.chain_id, &self.policy.expected_chain),
            ..Signals::default()
        };
        evidence.right_network = signals.network;
        if signals.network == MatchKey::Mismatched {
            let name = parse_caip2_chain_id(&request.chain_id)
                .map(get_chain_name)
                .unwrap_or("Unknown");
            warn!("🌐 Transaction targets {} ({}), not {}", name, request.chain_id, self.policy.expected_chain);
        }

        match self.gather(request, &mut evidence, &mut signals).await {
            Ok(classification) => Evaluation {
                verdict: self.engine.evaluate(classification, &signals),
                evidence,
                degraded: false,
            },
            Err(e) => {
                warn!("⚠️ Checks incomplete: {}", e);
                evidence.error = Some(ErrorRecord::from(&e));
                Evaluation {
                    verdict: self
                        .engine
                        .evaluate_incomplete(evidence.recipient_type, &signals),
                    evidence,
                    degraded: true,
                }
            }
        }
    }

    async fn gather(
        &self,
        request: &TransactionRequest,
        evidence: &mut Evidence,
        signals: &mut Signals,
    ) -> AppResult<RecipientClassification> {
        let tx = Transaction::parse(&request.transaction)?;

        evidence.usdce_token = tx.to == self.policy.usdce;
        evidence.usdc_token = tx.to == self.policy.usdc;
        signals.token = TokenKind::resolve(&[
            (TokenKind::UsdcE, evidence.usdce_token),
            (TokenKind::Usdc, evidence.usdc_token),
        ]);

        let intent = RecipientResolver::resolve(&tx)?;
        evidence.native_token = Some(intent.is_native);
        evidence.raw_recipient = if intent.is_native {
            Some(checksum_address(&tx.to))
        } else {
            tx.data.get(4..36).map(|word| format!("0x{}", hex::encode(word)))
        };
        evidence.actual_recipient = Some(checksum_address(&intent.recipient));
        evidence.amount = Some(intent.amount);

        let (classification, code) =
            ContractIdentifier::identify(self.client.as_ref(), &intent, &self.policy.proxy_wallet_code)
                .await?;
        evidence.code = Some(code);
        evidence.recipient_type = Some(classification);

        if classification != RecipientClassification::Polymarket {
            return Ok(classification);
        }

        let block = CreationBlockLocator::locate(self.client.as_ref(), intent.recipient).await?;
        evidence.creation_block_number = Some(block);

        if let Some(found) = self.matcher.find(self.client.as_ref(), block).await? {
            let match_sender = found.evidence.emitted_by == tx.from;
            let match_recipient = found.evidence.emitted_to == intent.recipient;
            signals.account = MatchKey::from_option(Some(match_sender));
            evidence.match_sender = Some(match_sender);
            evidence.match_recipient = Some(match_recipient);
            evidence.event_log = Some(found);
        }

        Ok(classification)
    }
}
