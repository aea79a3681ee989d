//! API Request Handlers

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

use super::types::*;
use crate::core::evaluator::DepositGuard;
use crate::core::presenter::InsightResponse;
use crate::models::errors::AppError;
use crate::models::types::TransactionRequest;
use crate::providers::chain::ChainClient;
use crate::utils::telemetry::{TelemetryCollector, TelemetryStats};

/// Shared application state
pub struct AppState {
    pub guard: Arc<DepositGuard<dyn ChainClient>>,
    pub telemetry: Arc<TelemetryCollector>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(guard: Arc<DepositGuard<dyn ChainClient>>, telemetry: Arc<TelemetryCollector>) -> Self {
        Self {
            guard,
            telemetry,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

type ErrorReply = (StatusCode, Json<ApiResponse<()>>);

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        expected_chain: state.guard.policy().expected_chain.clone(),
    };

    Json(ApiResponse::success(data, start.elapsed().as_secs_f64() * 1000.0))
}

// ============================================
// Transaction Insight
// ============================================

/// Evaluate a pending transaction. Evaluation problems still answer 200
/// with a renderable tree; only unreadable requests are rejected.
pub async fn transaction_insight(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TransactionRequest>, JsonRejection>,
) -> Result<Json<InsightResponse>, ErrorReply> {
    let start = Instant::now();

    let Json(request) = payload.map_err(|rejection| {
        let e = AppError::bad_request(rejection.body_text());
        warn!("⚠️ Rejected insight request: {}", e);
        (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(
                ApiError::from(&e),
                start.elapsed().as_secs_f64() * 1000.0,
            )),
        )
    })?;

    let outcome = state.guard.insight(&request).await;
    state
        .telemetry
        .record(outcome.response.severity, outcome.degraded, outcome.latency_ms);

    Ok(Json(outcome.response))
}

// ============================================
// Statistics
// ============================================

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<TelemetryStats>> {
    let start = Instant::now();
    let stats = state.telemetry.get_stats();
    Json(ApiResponse::success(stats, start.elapsed().as_secs_f64() * 1000.0))
}
