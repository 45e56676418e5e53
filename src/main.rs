// OnTime - keeps a local mirror of Google calendars up to date
// Entry point for the background sync daemon

use anyhow::{Context, Result};
use log::{error, info};
use ontime::calendar::GoogleConnector;
use ontime::clock::{Clock, SystemClock};
use ontime::config::Config;
use ontime::database::Database;
use ontime::http_config::HttpConfig;
use ontime::scheduler::run_sync_loop;
use ontime::service::SyncService;
use ontime::utils::logging::{init_logging, log_error_with_context};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = run().await {
        log_error_with_context(&e, "Startup");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    info!("Starting OnTime v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let db = Database::connect(&config.database_url).await?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let connector = GoogleConnector::new(config.google.clone(), &HttpConfig::default(), clock.clone())
        .context("Failed to build Google connector")?;
    let service = SyncService::new(db, Arc::new(connector), clock);

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, shutting down");
                signal_token.cancel();
            }
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
    });

    run_sync_loop(service, config.sync_interval, shutdown).await;

    info!("OnTime stopped");
    Ok(())
}
