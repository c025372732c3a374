//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Notify, RwLock};
use tradedesk::auth::{AccessVerifier, AuthError};
use tradedesk::core::http::{create_router, AppState, HealthStatus};
use tradedesk::db::MemoryJobStore;
use tradedesk::fanout::FanOutService;
use tradedesk::metrics::Metrics;
use tradedesk::services::{NotifyError, WorkerNotifier};
use url::Url;

pub const ACCESS_CODE: &str = "let-me-trade";

/// Accepts exactly [`ACCESS_CODE`].
pub struct StaticVerifier;

#[async_trait]
impl AccessVerifier for StaticVerifier {
    async fn verify(&self, code: &str) -> Result<bool, AuthError> {
        Ok(code == ACCESS_CODE)
    }
}

/// Counts wake-ups instead of calling a worker
#[derive(Default)]
pub struct RecordingNotifier {
    calls: AtomicUsize,
    woken: Notify,
    unreachable: bool,
}

impl RecordingNotifier {
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Waits up to two seconds for the first wake-up.
    pub async fn wait_for_wake(&self) -> bool {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.calls() == 0 {
                self.woken.notified().await;
            }
        })
        .await
        .is_ok()
    }

    /// Gives a spawned ping time to arrive, then reports whether none did.
    pub async fn stayed_quiet(&self) -> bool {
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.calls() == 0
    }
}

#[async_trait]
impl WorkerNotifier for RecordingNotifier {
    async fn wake(&self) -> Result<(), NotifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.woken.notify_one();
        if self.unreachable {
            Err(NotifyError::Unreachable("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

pub fn app_state(
    store: MemoryJobStore,
    notifier: Arc<dyn WorkerNotifier>,
    metrics: Arc<Metrics>,
) -> AppState {
    AppState {
        health: Arc::new(RwLock::new(HealthStatus::default())),
        metrics: metrics.clone(),
        start_time: Arc::new(Instant::now()),
        fanout: FanOutService::new(Arc::new(store), notifier).with_metrics(metrics),
        verifier: Arc::new(StaticVerifier),
    }
}

/// Test helper for API server integration tests
pub struct TestApiServer {
    pub server: TestServer,
    pub store: MemoryJobStore,
    pub notifier: Arc<RecordingNotifier>,
    pub metrics: Arc<Metrics>,
}

impl TestApiServer {
    pub async fn new() -> Self {
        Self::with_notifier(RecordingNotifier::default()).await
    }

    pub async fn with_notifier(notifier: RecordingNotifier) -> Self {
        let store = MemoryJobStore::new();
        let notifier = Arc::new(notifier);
        let metrics = Arc::new(Metrics::new().expect("metrics initialization"));
        let state = app_state(store.clone(), notifier.clone(), metrics.clone());

        let server = TestServer::new(create_router(state)).expect("start test server");
        Self {
            server,
            store,
            notifier,
            metrics,
        }
    }
}

/// Serves the router on an ephemeral local port and returns its base URL.
pub async fn spawn_server(state: AppState) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, create_router(state))
            .await
            .expect("serve test app");
    });
    Url::parse(&format!("http://{}", addr)).expect("server url")
}
