mod error;
mod handlers;
mod types;

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use log::info;

use crate::core::SweepError;
use crate::service::PartitionService;

pub struct PartitionApi {
    service: Arc<PartitionService>,
}

impl PartitionApi {
    pub fn new(service: Arc<PartitionService>) -> Self {
        Self { service }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route(
                "/api/partitions/identify-tables",
                post(handlers::identify_tables),
            )
            .route(
                "/api/partitions/identify-empty-partitions",
                post(handlers::identify_empty_partitions),
            )
            .route(
                "/api/partitions/drop-empty-partitions",
                post(handlers::drop_empty_partitions),
            )
            .route(
                "/api/partitions/empty-partitions",
                get(handlers::list_empty_partitions),
            )
            .with_state(self.service.clone())
    }

    pub async fn serve<F>(self, addr: &str, shutdown: F) -> Result<(), SweepError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| SweepError::IoError(format!("binding to {addr}: {e}")))?;
        info!("listening on {addr}");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| SweepError::IoError(format!("serving: {e}")))?;
        Ok(())
    }
}
