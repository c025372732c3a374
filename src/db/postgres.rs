//! PostgreSQL job store and change feed
//!
//! Change notifications come from a statement-level trigger that calls
//! `pg_notify('trade_changes', TG_OP)`; the reader LISTENs on a dedicated
//! connection.

use crate::config::StoreConfig;
use crate::db::store::{ChangeEvent, JobReader, JobStore, StoreError};
use crate::models::{Job, NewJob};
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use futures_util::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio_postgres::{AsyncMessage, Client, NoTls, Row};
use tracing::{debug, error, info, warn};

pub const CHANGE_CHANNEL: &str = "trade_changes";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS trades (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    ticker TEXT NOT NULL,
    action TEXT NOT NULL CHECK (action IN ('BUY', 'SELL')),
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    brokerage TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'PENDING'
        CHECK (status IN ('PENDING', 'RUNNING', 'COMPLETED', 'FAILED')),
    log TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
);

CREATE INDEX IF NOT EXISTS trades_created_at_idx ON trades (created_at DESC);

CREATE OR REPLACE FUNCTION notify_trade_changes() RETURNS trigger AS $$
BEGIN
    PERFORM pg_notify('trade_changes', TG_OP);
    RETURN NULL;
END;
$$ LANGUAGE plpgsql;

CREATE OR REPLACE TRIGGER trades_notify
    AFTER INSERT OR UPDATE OR DELETE OR TRUNCATE ON trades
    FOR EACH STATEMENT EXECUTE FUNCTION notify_trade_changes();
";

const INSERT_JOBS: &str = "
INSERT INTO trades (ticker, action, quantity, brokerage, status)
SELECT * FROM UNNEST($1::text[], $2::text[], $3::int4[], $4::text[], $5::text[])";

const SELECT_JOBS: &str = "
SELECT id, ticker, action, quantity, brokerage, status, log, created_at
FROM trades
ORDER BY created_at DESC";

async fn connect(connection_string: &str) -> Result<Client, StoreError> {
    let (client, connection) = tokio_postgres::connect(connection_string, NoTls)
        .await
        .map_err(|e| StoreError::Connection(format!("Failed to connect to job store: {}", e)))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!(error = %e, "Job store connection error");
        }
    });

    Ok(client)
}

fn connection_string(config: &StoreConfig) -> Result<String, StoreError> {
    config
        .connection_string()
        .map_err(|e| StoreError::Connection(e.to_string()))
}

fn job_from_row(row: &Row) -> Result<Job, StoreError> {
    let action: String = row.try_get("action")?;
    let brokerage: String = row.try_get("brokerage")?;
    let status: String = row.try_get("status")?;
    let quantity: i32 = row.try_get("quantity")?;

    Ok(Job {
        id: row.try_get("id")?,
        ticker: row.try_get("ticker")?,
        action: action.parse()?,
        quantity: u32::try_from(quantity)
            .map_err(|_| StoreError::Decode(format!("negative quantity {}", quantity)))?,
        brokerage: brokerage.parse()?,
        status: status.parse()?,
        log: row.try_get("log")?,
        created_at: row.try_get("created_at")?,
    })
}

/// One client connection that is reopened after the server drops it.
struct PgConnection {
    connection_string: String,
    client: RwLock<Arc<Client>>,
}

impl PgConnection {
    async fn open(connection_string: String) -> Result<Self, StoreError> {
        let client = connect(&connection_string).await?;
        Ok(Self {
            connection_string,
            client: RwLock::new(Arc::new(client)),
        })
    }

    /// The live client, reconnecting first when the current one is closed.
    async fn client(&self) -> Result<Arc<Client>, StoreError> {
        {
            let current = self.client.read().await;
            if !current.is_closed() {
                return Ok(current.clone());
            }
        }

        let mut current = self.client.write().await;
        // Another caller may have reconnected while we waited for the lock.
        if current.is_closed() {
            warn!("Job store connection lost, reconnecting");
            let client = (|| connect(&self.connection_string))
                .retry(request_backoff())
                .notify(|e: &StoreError, delay: Duration| {
                    warn!(error = %e, delay_ms = delay.as_millis() as u64, "Job store reconnect failed, retrying");
                })
                .await?;
            *current = Arc::new(client);
            info!("Job store connection re-established");
        }
        Ok(current.clone())
    }
}

/// Mutating side of the store, connected with the elevated credential
pub struct PgJobStore {
    conn: PgConnection,
}

impl PgJobStore {
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let conn = PgConnection::open(connection_string(config)?).await?;
        let store = Self { conn };
        store.init_schema().await?;
        info!(user = %config.credentials.user, "Job store connected");
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        self.conn
            .client()
            .await?
            .batch_execute(SCHEMA)
            .await
            .map_err(|e| StoreError::Query(format!("Failed to initialize schema: {}", e)))
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn insert_jobs(&self, jobs: &[NewJob]) -> Result<u64, StoreError> {
        let tickers: Vec<&str> = jobs.iter().map(|j| j.ticker.as_str()).collect();
        let actions: Vec<&str> = jobs.iter().map(|j| j.action.as_str()).collect();
        let quantities = jobs
            .iter()
            .map(|j| i32::try_from(j.quantity))
            .collect::<Result<Vec<i32>, _>>()
            .map_err(|_| StoreError::Query("quantity exceeds the integer column range".into()))?;
        let brokerages: Vec<&str> = jobs.iter().map(|j| j.brokerage.as_str()).collect();
        let statuses: Vec<&str> = jobs.iter().map(|j| j.status.as_str()).collect();

        // Not retried: a connection lost mid-statement may still have committed.
        let inserted = self
            .conn
            .client()
            .await?
            .execute(
                INSERT_JOBS,
                &[&tickers, &actions, &quantities, &brokerages, &statuses],
            )
            .await?;

        debug!(count = inserted, "PgJobStore: inserted {} jobs", inserted);
        Ok(inserted)
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let removed = self
            .conn
            .client()
            .await?
            .execute("DELETE FROM trades", &[])
            .await?;
        debug!(count = removed, "PgJobStore: deleted {} jobs", removed);
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.conn.client().await?.batch_execute("SELECT 1").await?;
        Ok(())
    }
}

/// Read side of the store, connected with the restricted credential
pub struct PgJobReader {
    conn: PgConnection,
}

impl PgJobReader {
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let conn = PgConnection::open(connection_string(config)?).await?;
        info!(user = %config.credentials.user, "Job reader connected");
        Ok(Self { conn })
    }
}

#[async_trait]
impl JobReader for PgJobReader {
    /// Reads are idempotent, so a query that loses its connection is retried
    /// once on a fresh one.
    async fn list_jobs(&self) -> Result<Vec<Job>, StoreError> {
        let rows = match self.conn.client().await?.query(SELECT_JOBS, &[]).await {
            Err(e) if e.is_closed() => {
                debug!("Job reader connection closed mid-query, retrying");
                self.conn.client().await?.query(SELECT_JOBS, &[]).await?
            }
            result => result?,
        };
        rows.iter().map(job_from_row).collect()
    }

    fn changes(&self) -> BoxStream<'static, ChangeEvent> {
        change_feed(self.conn.connection_string.clone())
    }
}

/// An open LISTEN session. Dropping it closes the connection.
struct Listener {
    _client: Client,
    events: mpsc::UnboundedReceiver<ChangeEvent>,
}

async fn listen(connection_string: &str) -> Result<Listener, StoreError> {
    let (client, mut connection) = tokio_postgres::connect(connection_string, NoTls)
        .await
        .map_err(|e| StoreError::Connection(format!("Failed to open change feed: {}", e)))?;

    let (tx, events) = mpsc::unbounded_channel();

    // The connection only makes progress while polled, so drive it before LISTEN.
    tokio::spawn(async move {
        let mut messages = std::pin::pin!(stream::poll_fn(move |cx| connection.poll_message(cx)));
        while let Some(message) = messages.next().await {
            match message {
                Ok(AsyncMessage::Notification(n)) => {
                    let event = ChangeEvent::from_operation(n.payload());
                    debug!(channel = n.channel(), event = ?event, "Change notification");
                    if tx.send(event).is_err() {
                        break;
                    }
                }
                Ok(AsyncMessage::Notice(notice)) => {
                    debug!(notice = %notice.message(), "Change feed notice");
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "Change feed connection error");
                    break;
                }
            }
        }
    });

    client
        .batch_execute(&format!("LISTEN {}", CHANGE_CHANNEL))
        .await?;

    Ok(Listener {
        _client: client,
        events,
    })
}

/// Short, bounded retry for reconnects on the request path.
fn request_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(100))
        .with_max_delay(Duration::from_secs(2))
        .with_max_times(3)
        .with_jitter()
}

fn reconnect_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(250))
        .with_max_delay(Duration::from_secs(30))
        .with_max_times(8)
        .with_jitter()
}

/// Opens a LISTEN session, retrying until one succeeds.
async fn open_listener(connection_string: &str) -> Listener {
    loop {
        let attempt = (|| listen(connection_string))
            .retry(reconnect_backoff())
            .notify(|e: &StoreError, delay: Duration| {
                warn!(error = %e, delay_ms = delay.as_millis() as u64, "Change feed connect failed, retrying");
            })
            .await;

        match attempt {
            Ok(listener) => return listener,
            Err(e) => {
                error!(error = %e, "Change feed still unreachable after backoff, starting over");
            }
        }
    }
}

/// Discards events already queued behind the one being delivered; a single
/// reload covers all of them. Returns how many were dropped.
fn drain_pending(events: &mut mpsc::UnboundedReceiver<ChangeEvent>) -> usize {
    let mut drained = 0;
    while events.try_recv().is_ok() {
        drained += 1;
    }
    drained
}

enum FeedState {
    Connect,
    Listening(Listener),
}

/// Nothing connects until the stream is first polled. Every (re)connect is
/// announced with [`ChangeEvent::Resync`] so a consumer that loaded before the
/// LISTEN took effect catches up.
fn change_feed(connection_string: String) -> BoxStream<'static, ChangeEvent> {
    stream::unfold(FeedState::Connect, move |mut state| {
        let connection_string = connection_string.clone();
        async move {
            loop {
                state = match state {
                    FeedState::Connect => {
                        let listener = open_listener(&connection_string).await;
                        info!(channel = CHANGE_CHANNEL, "Change feed listening");
                        return Some((ChangeEvent::Resync, FeedState::Listening(listener)));
                    }
                    FeedState::Listening(mut listener) => match listener.events.recv().await {
                        Some(event) => {
                            let collapsed = drain_pending(&mut listener.events);
                            if collapsed > 0 {
                                debug!(collapsed, "Collapsed queued change events");
                            }
                            return Some((event, FeedState::Listening(listener)));
                        }
                        None => {
                            warn!("Change feed connection lost, reconnecting");
                            FeedState::Connect
                        }
                    },
                };
            }
        }
    })
    .boxed()
}
