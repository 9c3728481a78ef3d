// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Aula Core - Lifecycle Daemon
//!
//! Standalone process responsible for:
//! - Applying database migrations at startup
//! - Running the course lifecycle reconciler (hourly + once at start)
//!
//! The API layer embeds the same runtime via [`aula_core::runtime`] to
//! serve admission and transition requests against the shared database.

use std::sync::Arc;

use tracing::{info, warn};

use aula_core::config::Config;
use aula_core::directory::PgDirectory;
use aula_core::notifier::NullNotifier;
use aula_core::reconciler::ReconcilerConfig;
use aula_core::runtime::CoreRuntime;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aula_core=info".into()),
        )
        .init();

    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        warn!("No .env file loaded: {}", e);
    }

    // Load configuration
    let config = Config::from_env()?;

    info!(
        reconcile_interval_secs = config.reconcile_interval.as_secs(),
        "Starting Aula Core"
    );

    // Connect to database
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    info!("Connected to database");

    aula_core::migrations::run(&pool).await?;

    info!("Database schema verified");

    // Start the runtime
    let runtime = CoreRuntime::builder()
        .pool(pool.clone())
        .directory(Arc::new(PgDirectory::new(pool.clone())))
        .notifier(Arc::new(NullNotifier))
        .reconciler_config(ReconcilerConfig {
            poll_interval: config.reconcile_interval,
            run_at_startup: config.reconcile_at_startup,
        })
        .request_timeout(config.request_timeout)
        .build()?
        .start()
        .await?;

    info!("Aula Core ready");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    // Graceful shutdown
    runtime.shutdown().await?;

    info!("Aula Core shut down");

    Ok(())
}
