use axum::body::to_bytes;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::Value;
use tradedesk::auth::AuthError;
use tradedesk::db::StoreError;
use tradedesk::error::AppError;
use tradedesk::fanout::FanOutError;

async fn render(error: AppError) -> (StatusCode, Value) {
    let response = error.into_response();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn store_failure_is_500_with_store_message() {
    let error = AppError::from(FanOutError::Store(StoreError::Query(
        "permission denied for table trades".into(),
    )));
    let (status, body) = render(error).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "permission denied for table trades");
}

#[tokio::test]
async fn invalid_quantity_is_400() {
    let error = AppError::from(FanOutError::InvalidQuantity("abc".into()));
    let (status, body) = render(error).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("'abc'"));
}

#[tokio::test]
async fn unauthorized_is_401() {
    let (status, body) = render(AppError::Unauthorized("Invalid access code".into())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid access code");
}

#[tokio::test]
async fn verifier_breakage_is_500() {
    let (status, body) = render(AppError::from(AuthError::Verification("pool gone".into()))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("pool gone"));
}
