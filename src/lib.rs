//! Deposit Sentry
//!
//! Pre-signing check for deposits into Polymarket proxy wallets on Polygon.
//! For each pending transaction it:
//! - Recovers the real recipient from token transfer calldata
//! - Confirms the recipient runs the proxy wallet template
//! - Finds the wallet's deployment log and checks who it was deployed for
//! - Checks network and token, then renders a Safe/Caution/Critical checklist

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::{
    CreationBlockLocator, DecisionTable, DepositGuard, DeploymentLogMatcher, Evaluation,
    InsightResponse, RiskRuleEngine, VerdictPresenter,
};
pub use models::{AppError, AppResult, ErrorCode, GuardConfig, Severity, TransactionRequest};
pub use providers::{ChainClient, RpcProvider};
pub use utils::TelemetryCollector;
