//! HTTP endpoint server using Axum

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Json, Response},
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

use crate::auth::{AccessVerifier, Argon2AccessVerifier, Operator};
use crate::config::{ServerConfig, StoreBackend};
use crate::db::{JobStore, MemoryJobStore, PgJobStore};
use crate::error::{AppError, AppResult};
use crate::fanout::{FanOutService, TradeRequest};
use crate::metrics::Metrics;
use crate::services::HttpWorkerNotifier;

#[derive(Clone)]
pub struct AppState {
    pub health: Arc<RwLock<HealthStatus>>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub fanout: FanOutService,
    pub verifier: Arc<dyn AccessVerifier>,
}

/// Result of the most recent health check
#[derive(Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
    pub store_error: Option<String>,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
            store_error: None,
        }
    }
}

/// Pings the job store; 503 with `status: "degraded"` while it is unreachable.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let ping = state.fanout.check_store().await;

    let mut health = state.health.write().await;
    match ping {
        Ok(()) => {
            if health.store_error.take().is_some() {
                info!("Job store reachable again");
            }
            health.status = "healthy".to_string();
        }
        Err(e) => {
            if health.store_error.is_none() {
                warn!(error = %e, "Job store unreachable, reporting degraded");
            }
            health.status = "degraded".to_string();
            health.store_error = Some(e.to_string());
        }
    }

    let code = if health.store_error.is_none() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let uptime_seconds = state.start_time.elapsed().as_secs();
    (
        code,
        Json(json!({
            "status": health.status,
            "uptime_seconds": uptime_seconds,
            "service": "tradedesk-fanout",
            "store_error": health.store_error,
        })),
    )
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();
    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();
    state.metrics.http_requests_in_flight.dec();

    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis(),
            "HTTP request error"
        );
    }

    response
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Fan a submission out into one job per (ticker, brokerage)
async fn submit_trade(
    _operator: Operator,
    State(state): State<AppState>,
    body: Result<Json<TradeRequest>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let request = json_body(body)?;
    let receipt = state.fanout.submit(&request).await?;
    Ok(Json(json!({ "success": true, "count": receipt.count })))
}

/// Delete every job, irreversibly
async fn clear_history(
    _operator: Operator,
    State(state): State<AppState>,
) -> AppResult<Json<Value>> {
    state.fanout.clear_history().await?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
struct VerifyAccessRequest {
    code: String,
}

/// Login gate used by the dashboard before it shows anything
async fn verify_access(
    State(state): State<AppState>,
    body: Result<Json<VerifyAccessRequest>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let request = json_body(body)?;
    if state.verifier.verify(&request.code).await? {
        Ok(Json(json!({ "success": true })))
    } else {
        warn!("Rejected login with invalid access code");
        Err(AppError::Unauthorized("Invalid access code".into()))
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/trade", post(submit_trade))
        .route("/history", delete(clear_history))
        .route("/auth/verify", post(verify_access))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Wire the service's collaborators from configuration.
pub async fn build_state(config: &ServerConfig) -> Result<AppState, Box<dyn std::error::Error>> {
    let metrics = Arc::new(Metrics::new()?);

    let store: Arc<dyn JobStore> = match (config.backend, &config.store) {
        (StoreBackend::Postgres, Some(store_config)) => {
            Arc::new(PgJobStore::connect(store_config).await?)
        }
        (StoreBackend::Postgres, None) => {
            return Err("STORE_URL and STORE_SERVICE_CREDENTIALS are required".into());
        }
        (StoreBackend::Memory, _) => {
            warn!("Using in-memory job store - jobs are lost on restart");
            Arc::new(MemoryJobStore::new())
        }
    };

    let notifier = Arc::new(HttpWorkerNotifier::new(
        config.worker_url.clone(),
        config.worker_wake_timeout,
    )?);
    let verifier = Arc::new(Argon2AccessVerifier::new(config.access_code_hash.clone())?);

    Ok(AppState {
        health: Arc::new(RwLock::new(HealthStatus::default())),
        metrics: metrics.clone(),
        start_time: Arc::new(Instant::now()),
        fanout: FanOutService::new(store, notifier).with_metrics(metrics),
        verifier,
    })
}

pub async fn start_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state(&config).await?;
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    info!(port = config.port, "HTTP server listening on port {}", config.port);
    info!(worker_url = %config.worker_url, "Worker wake-up target");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections...");
}
