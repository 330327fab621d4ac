use serde::Serialize;

use crate::cleanup::{DropEntry, DropReport};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyTablesResponse {
    pub message: String,
    pub tables_identified: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyEmptyPartitionsResponse {
    pub message: String,
    pub empty_partitions_identified: usize,
}

/// The drop count plus every partition that was not dropped and why.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DropEmptyPartitionsResponse {
    pub message: String,
    pub partitions_dropped: usize,
    pub skipped: Vec<DropEntry>,
    pub failed: Vec<DropEntry>,
}

impl From<DropReport> for DropEmptyPartitionsResponse {
    fn from(report: DropReport) -> Self {
        Self {
            message: "Empty partitions drop completed".to_string(),
            partitions_dropped: report.dropped(),
            skipped: report.skipped().cloned().collect(),
            failed: report.failed().cloned().collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
