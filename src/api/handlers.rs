use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use log::info;

use crate::service::PartitionService;
use crate::tracking::TrackedEmptyPartition;

use super::error::ApiError;
use super::types::{
    DropEmptyPartitionsResponse, IdentifyEmptyPartitionsResponse, IdentifyTablesResponse,
};

pub async fn health() -> &'static str {
    "OK"
}

/// POST /api/partitions/identify-tables
pub async fn identify_tables(
    State(service): State<Arc<PartitionService>>,
) -> Result<Json<IdentifyTablesResponse>, ApiError> {
    info!("received request to identify tables");
    let count = service.identify_tables().await?;
    Ok(Json(IdentifyTablesResponse {
        message: "Tables identification completed".to_string(),
        tables_identified: count,
    }))
}

/// POST /api/partitions/identify-empty-partitions
pub async fn identify_empty_partitions(
    State(service): State<Arc<PartitionService>>,
) -> Result<Json<IdentifyEmptyPartitionsResponse>, ApiError> {
    info!("received request to identify empty partitions");
    let count = service.identify_empty_partitions().await?;
    Ok(Json(IdentifyEmptyPartitionsResponse {
        message: "Empty partitions identification completed".to_string(),
        empty_partitions_identified: count,
    }))
}

/// POST /api/partitions/drop-empty-partitions
pub async fn drop_empty_partitions(
    State(service): State<Arc<PartitionService>>,
) -> Result<Json<DropEmptyPartitionsResponse>, ApiError> {
    info!("received request to drop empty partitions");
    let report = service.drop_empty_partitions().await?;
    Ok(Json(report.into()))
}

/// GET /api/partitions/empty-partitions
pub async fn list_empty_partitions(
    State(service): State<Arc<PartitionService>>,
) -> Result<Json<Vec<TrackedEmptyPartition>>, ApiError> {
    Ok(Json(service.list_pending_drops().await?))
}
