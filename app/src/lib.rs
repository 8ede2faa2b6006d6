//! CosmoDEX pool service
//!
//! Loads configuration, recovers the pool from its journal and serves the
//! HTTP API.

pub mod event_watcher;

use std::sync::Arc;

use amm::{PoolService, PreFunded};
use anyhow::Context;
use cosmo_api::{start_server, AppState};
use cosmo_core::AppConfig;

fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cosmodex=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .init();
    Ok(())
}

pub async fn run() -> anyhow::Result<()> {
    init_tracing()?;
    tracing::info!("Starting CosmoDEX pool service");

    let config = AppConfig::from_env().context("loading configuration")?;
    config.validate().context("validating configuration")?;
    tracing::info!(
        "Pool {} / {}",
        config.pool.token_a.symbol,
        config.pool.token_b.symbol
    );

    // Token movement is settled by the surrounding orchestration layer.
    let service = PoolService::open(&config.pool, &config.storage, Arc::new(PreFunded))
        .context("opening pool")?;
    let snapshot = service.snapshot().await;
    tracing::info!(
        "Reserves {} / {}, {} shares, {} trades",
        snapshot.reserve_a,
        snapshot.reserve_b,
        snapshot.total_liquidity,
        snapshot.trade_count
    );

    event_watcher::spawn(service.subscribe());

    let state = AppState::new(service, config.clone()).context("building API state")?;
    start_server(state, &config.api)
        .await
        .context("running API server")?;
    Ok(())
}
