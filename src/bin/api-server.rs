//! tradedesk API Server
//!
//! Accepts trade submissions, fans them out into job rows, wakes the worker,
//! and clears history. Stateless apart from the job store, so it can be run
//! as several instances.

use dotenvy::dotenv;
use tracing::info;
use tradedesk::config::{self, ServerConfig};
use tradedesk::core::http::start_server;
use tradedesk::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if present
    dotenv().ok();

    logging::init_logging();

    let config = ServerConfig::from_env()?;
    let env = config::get_environment();
    info!("Starting tradedesk API Server");
    info!(environment = %env, "Environment");
    info!(backend = ?config.backend, "Job store backend");
    info!(port = config.port, "HTTP Server: http://0.0.0.0:{}", config.port);

    start_server(config).await?;

    info!("API server stopped");
    Ok(())
}
