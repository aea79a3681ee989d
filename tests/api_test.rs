//! HTTP surface tests, driven through the router without a socket

mod common;

use alloy_primitives::{address, Address};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use common::*;
use deposit_sentry::api::{create_router, handlers::AppState};
use deposit_sentry::models::config::ReceiptsMode;
use deposit_sentry::{ChainClient, DepositGuard, RiskRuleEngine, TelemetryCollector};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const USDCE: Address = address!("2791Bca1f2de4661ED88A30C99A7a9449Aa84174");
const WALLET: Address = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
const USER: Address = address!("1111111111111111111111111111111111111111");

fn state() -> Arc<AppState> {
    let chain: Arc<dyn ChainClient> = Arc::new(
        MockChain::new(10_000)
            .with_contract(WALLET, 77, proxy_code())
            .with_receipts(77, vec![deployment_receipt("0x01", WALLET, USER)]),
    );
    let guard = DepositGuard::with_policy(
        chain,
        policy(),
        ReceiptsMode::Auto,
        RiskRuleEngine::standard().unwrap(),
        Duration::from_secs(5),
    )
    .unwrap();
    Arc::new(AppState::new(Arc::new(guard), Arc::new(TelemetryCollector::new())))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_insight_endpoint() {
    let state = state();
    let app = create_router(state.clone());

    let request = erc20_request(USDCE, WALLET, 1_000_000, USER, POLYGON);
    let response = app
        .oneshot(
            Request::post("/v1/transaction/insight")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&request).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["severity"], "safe");
    assert_eq!(json["content"]["type"], "panel");

    let stats = state.telemetry.get_stats();
    assert_eq!(stats.total_evaluations, 1);
    assert_eq!(stats.safe, 1);
}

#[tokio::test]
async fn test_insight_rejects_unreadable_body() {
    let app = create_router(state());

    let response = app
        .oneshot(
            Request::post("/v1/transaction/insight")
                .header("content-type", "application/json")
                .body(Body::from("{\"transaction\": 5}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "API_BAD_REQUEST");
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_router(state());

    let response = app
        .oneshot(Request::get("/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "healthy");
    assert_eq!(json["data"]["expected_chain"], "eip155:137");
}
