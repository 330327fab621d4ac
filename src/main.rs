use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::{error, info};
use tokio::sync::watch;

use partsweep::api::PartitionApi;
use partsweep::conf::Config;
use partsweep::core::{CliArgs, Ident, setup_logging};
use partsweep::db::PgDatabase;
use partsweep::scheduler::Scheduler;
use partsweep::service::PartitionService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging();
    let args = CliArgs::parse();
    info!(args = args; "partsweep started");

    let config = Config::load(args.config.as_deref()).context("loading config")?;
    let tracking_schema = Ident::new(&config.partitions.tracking_schema)?;
    let db = PgDatabase::connect(&config.database, &tracking_schema)
        .await
        .context("connecting to postgres")?;
    let service = Arc::new(PartitionService::new(Arc::new(db), &config)?);
    info!(
        "sweeping empty partitions in schema {} (tracking in {})",
        service.schema(),
        tracking_schema
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let jobs = if config.schedule.enabled && !args.no_scheduler {
        Scheduler::new(Arc::clone(&service), &config.schedule)?.spawn(shutdown_rx)
    } else {
        info!("scheduler disabled");
        Vec::new()
    };

    PartitionApi::new(service)
        .serve(&config.server.addr(), shutdown_signal())
        .await
        .context("running http server")?;

    let _ = shutdown_tx.send(true);
    for job in jobs {
        if let Err(e) = job.await {
            error!("scheduler task failed: {e}");
        }
    }
    info!("partsweep stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("cannot listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
