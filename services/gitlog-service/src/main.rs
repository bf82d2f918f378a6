mod app;
mod config;
mod db;
mod error;
mod handlers;
mod memory;
mod models;
mod routes;
mod state;
mod store;
mod validate;

use std::sync::Arc;

use anyhow::Context;
use gitlog_common::{bind_listener, init_tracing, running_on_lambda, shutdown_signal};

use crate::config::{ServiceConfig, StoreBackend};
use crate::db::PgLogStore;
use crate::memory::MemoryLogStore;
use crate::state::AppState;
use crate::store::LogStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let guards = init_tracing("gitlog-service");
    tracing::debug!(file_output = guards.has_file_output(), "tracing initialised");

    let config = ServiceConfig::from_env().context("load configuration")?;
    let store = connect_store(&config).await?;
    let app = app::build_router(AppState::new(store));

    if running_on_lambda() {
        tracing::info!("serving through the lambda runtime");
        lambda_http::run(app)
            .await
            .map_err(|err| anyhow::anyhow!("lambda runtime failed: {err}"))?;
        return Ok(());
    }

    let listener = bind_listener(config.port)
        .await
        .with_context(|| format!("bind port {}", config.port))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;
    Ok(())
}

/// Opens the store once; every request shares the returned handle.
async fn connect_store(config: &ServiceConfig) -> anyhow::Result<Arc<dyn LogStore>> {
    match (config.backend, config.database.as_ref()) {
        (StoreBackend::Postgres, Some(database)) => {
            let store = PgLogStore::connect(database)
                .await
                .context("connect database")?;
            tracing::info!("connected to postgres");
            Ok(Arc::new(store))
        }
        (StoreBackend::Postgres, None) => anyhow::bail!("postgres backend has no database config"),
        (StoreBackend::Memory, _) => {
            tracing::warn!("using in-memory store; entries are lost on exit");
            Ok(Arc::new(MemoryLogStore::new()))
        }
    }
}
