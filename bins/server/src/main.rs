//! Moneta API Server
//!
//! Main entry point for the ledger service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use moneta_api::{AppState, FreeCurrencyApi, MoneyServices, create_router};
use moneta_core::currency::RateCache;
use moneta_db::migration::Migrator;
use moneta_db::{SeaUnitOfWork, TransactionQueryRepository, connect};
use moneta_shared::AppConfig;
use moneta_shared::config::LogConfig;
use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.log);

    // Connect and bring the schema up to date
    let db = connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );
    Migrator::up(&db, None)
        .await
        .context("Failed to apply migrations")?;

    // Rates are refreshed lazily on read, so a failed warm-up is not fatal
    let provider = FreeCurrencyApi::new(&config.currency).context("Failed to build rate client")?;
    let rates = Arc::new(RateCache::new(
        provider,
        Duration::from_secs(config.currency.ttl_secs),
    ));
    if rates.refresh().await.is_err() {
        warn!("Starting without exchange rates");
    }

    let unit_of_work = SeaUnitOfWork::new(
        db.clone(),
        Duration::from_secs(config.database.mutation_timeout_secs),
    );
    let money = MoneyServices::new(unit_of_work, TransactionQueryRepository::new(db), rates);
    let state = AppState::new(Arc::new(money), config.server.request_body_limit);

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(log: &LogConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let (json, plain) = if log.json {
        (Some(fmt::layer().json()), None)
    } else {
        (None, Some(fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .init();
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}
