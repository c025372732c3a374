//! Integration tests for the API Server
//!
//! Tests HTTP endpoints, access control, metrics, and the fan-out contract.

use serde_json::{json, Value};
use tradedesk::db::{JobReader, JobStore};
use tradedesk::models::{Brokerage, JobStatus, NewJob, TradeAction};

use crate::test_utils::{RecordingNotifier, TestApiServer, ACCESS_CODE};

fn two_by_two() -> Value {
    json!({
        "tickers": "AAPL TSLA",
        "action": "BUY",
        "quantity": 10,
        "brokerages": ["Fidelity", "Schwab"]
    })
}

#[tokio::test]
async fn health_endpoint_reports_healthy_status() {
    let app = TestApiServer::new().await;
    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["uptime_seconds"].as_u64().is_some());
    assert_eq!(body["service"], "tradedesk-fanout");
}

#[tokio::test]
async fn health_reports_degraded_while_store_is_unreachable() {
    let app = TestApiServer::new().await;
    app.store.set_unreachable(true);

    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), 503);
    let body: Value = response.json();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["store_error"], "connection closed");

    app.store.set_unreachable(false);
    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["store_error"].is_null());
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_metrics() {
    let app = TestApiServer::new().await;
    let _ = app.server.get("/health").await;

    let response = app.server.get("/metrics").await;
    assert_eq!(response.status_code(), 200);

    let body = response.text();
    for name in [
        "http_requests_total",
        "http_request_duration_seconds",
        "http_requests_in_flight",
        "jobs_created_total",
    ] {
        assert!(body.contains(name), "Expected {} metric", name);
    }
}

#[tokio::test]
async fn trade_creates_one_job_per_ticker_and_brokerage() {
    let app = TestApiServer::new().await;

    let response = app
        .server
        .post("/trade")
        .authorization_bearer(ACCESS_CODE)
        .json(&two_by_two())
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 4);

    let jobs = app.store.list_jobs().await.unwrap();
    assert_eq!(jobs.len(), 4);
    assert!(jobs
        .iter()
        .all(|j| j.status == JobStatus::Pending && j.quantity == 10 && j.action == TradeAction::Buy));
    for ticker in ["AAPL", "TSLA"] {
        for brokerage in [Brokerage::Fidelity, Brokerage::Schwab] {
            assert_eq!(
                jobs.iter()
                    .filter(|j| j.ticker == ticker && j.brokerage == brokerage)
                    .count(),
                1,
                "{} at {}",
                ticker,
                brokerage
            );
        }
    }

    assert!(app.notifier.wait_for_wake().await, "worker should be woken");
    assert_eq!(app.metrics.jobs_created_total.get(), 4);
}

#[tokio::test]
async fn trade_with_nothing_to_expand_returns_zero() {
    let app = TestApiServer::new().await;

    let response = app
        .server
        .post("/trade")
        .authorization_bearer(ACCESS_CODE)
        .json(&json!({
            "tickers": "   ",
            "action": "SELL",
            "quantity": 1,
            "brokerages": ["Sofi"]
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 0);
    assert!(app.store.is_empty().await);
    assert!(app.notifier.stayed_quiet().await);
}

#[tokio::test]
async fn store_failure_returns_500_and_skips_wakeup() {
    let app = TestApiServer::new().await;
    app.store.fail_inserts(true);

    let response = app
        .server
        .post("/trade")
        .authorization_bearer(ACCESS_CODE)
        .json(&two_by_two())
        .await;
    assert_eq!(response.status_code(), 500);

    let body: Value = response.json();
    assert_eq!(body["error"], "insert rejected by memory store");
    assert!(body.get("success").is_none());
    assert!(app.notifier.stayed_quiet().await);
}

#[tokio::test]
async fn unreachable_worker_still_succeeds() {
    let app = TestApiServer::with_notifier(RecordingNotifier::unreachable()).await;

    let response = app
        .server
        .post("/trade")
        .authorization_bearer(ACCESS_CODE)
        .json(&two_by_two())
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Value>()["count"], 4);
    assert!(app.notifier.wait_for_wake().await);
}

#[tokio::test]
async fn invalid_quantity_is_rejected() {
    let app = TestApiServer::new().await;

    for quantity in [json!("ten"), json!(0), json!(-1), json!(1.5)] {
        let response = app
            .server
            .post("/trade")
            .authorization_bearer(ACCESS_CODE)
            .json(&json!({
                "tickers": "AAPL",
                "action": "BUY",
                "quantity": quantity,
                "brokerages": ["Fidelity"]
            }))
            .await;
        assert_eq!(response.status_code(), 400, "quantity {}", quantity);
        assert!(response.json::<Value>()["error"].is_string());
    }
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn string_quantity_is_accepted() {
    let app = TestApiServer::new().await;

    let response = app
        .server
        .post("/trade")
        .authorization_bearer(ACCESS_CODE)
        .json(&json!({
            "tickers": "NVDA",
            "action": "SELL",
            "quantity": "3",
            "brokerages": ["Robinhood"]
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    let jobs = app.store.list_jobs().await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].quantity, 3);
}

#[tokio::test]
async fn malformed_body_is_400_with_error_shape() {
    let app = TestApiServer::new().await;

    let response = app
        .server
        .post("/trade")
        .authorization_bearer(ACCESS_CODE)
        .json(&json!({
            "tickers": "AAPL",
            "action": "HOLD",
            "quantity": 1,
            "brokerages": ["Fidelity"]
        }))
        .await;
    assert_eq!(response.status_code(), 400);
    assert!(response.json::<Value>()["error"].is_string());

    let response = app
        .server
        .post("/trade")
        .authorization_bearer(ACCESS_CODE)
        .json(&json!({
            "tickers": "AAPL",
            "action": "BUY",
            "quantity": 1,
            "brokerages": ["Vanguard"]
        }))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn mutations_require_a_valid_access_code() {
    let app = TestApiServer::new().await;

    let missing = app.server.post("/trade").json(&two_by_two()).await;
    assert_eq!(missing.status_code(), 401);
    assert!(missing.json::<Value>()["error"].is_string());

    let wrong = app
        .server
        .post("/trade")
        .authorization_bearer("guess")
        .json(&two_by_two())
        .await;
    assert_eq!(wrong.status_code(), 401);
    assert_eq!(wrong.json::<Value>()["error"], "Invalid access code");

    let clear = app.server.delete("/history").await;
    assert_eq!(clear.status_code(), 401);

    assert!(app.store.is_empty().await);
    assert!(app.notifier.stayed_quiet().await);
}

#[tokio::test]
async fn history_delete_removes_every_job() {
    let app = TestApiServer::new().await;
    app.store
        .insert_jobs(&[
            NewJob::pending("AAPL", TradeAction::Buy, 1, Brokerage::Fidelity),
            NewJob::pending("TSLA", TradeAction::Sell, 2, Brokerage::TRowe),
            NewJob::pending("MSFT", TradeAction::Buy, 3, Brokerage::Sofi),
        ])
        .await
        .unwrap();
    let jobs = app.store.list_jobs().await.unwrap();
    app.store
        .set_status(jobs[0].id, JobStatus::Failed, Some("rejected".into()))
        .await
        .unwrap();
    app.store
        .set_status(jobs[1].id, JobStatus::Running, None)
        .await
        .unwrap();

    let response = app
        .server
        .delete("/history")
        .authorization_bearer(ACCESS_CODE)
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Value>()["success"], true);
    assert!(app.store.is_empty().await);

    // Clearing an empty history is still a success.
    let again = app
        .server
        .delete("/history")
        .authorization_bearer(ACCESS_CODE)
        .await;
    assert_eq!(again.status_code(), 200);
}

#[tokio::test]
async fn verify_endpoint_checks_the_code() {
    let app = TestApiServer::new().await;

    let ok = app
        .server
        .post("/auth/verify")
        .json(&json!({ "code": ACCESS_CODE }))
        .await;
    assert_eq!(ok.status_code(), 200);
    assert_eq!(ok.json::<Value>()["success"], true);

    let denied = app
        .server
        .post("/auth/verify")
        .json(&json!({ "code": "nope" }))
        .await;
    assert_eq!(denied.status_code(), 401);

    let malformed = app.server.post("/auth/verify").json(&json!({})).await;
    assert_eq!(malformed.status_code(), 400);
}
