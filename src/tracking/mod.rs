//! Persistent record of discovered tables and empty partitions.

mod model;

use async_trait::async_trait;

use crate::core::SweepError;

pub use model::{TrackedEmptyPartition, TrackedTable};

/// The two tracking sets. Inserts are atomic insert-if-absent operations
/// keyed by `(table_name, schema)` and `(table_name, partition_name)`.
#[async_trait]
pub trait TrackingStore: Send {
    /// Returns false when the table was already recorded.
    async fn record_table_if_absent(
        &mut self,
        table_name: &str,
        schema: &str,
        has_partitions: bool,
    ) -> Result<bool, SweepError>;

    async fn list_partitioned_tables(&mut self, schema: &str)
    -> Result<Vec<TrackedTable>, SweepError>;

    /// Returns false when the partition was already recorded, dropped or not.
    async fn record_empty_partition_if_absent(
        &mut self,
        table_name: &str,
        partition_name: &str,
    ) -> Result<bool, SweepError>;

    /// Records not yet dropped, oldest first.
    async fn list_pending_drops(&mut self) -> Result<Vec<TrackedEmptyPartition>, SweepError>;

    /// Flags a pending record as dropped now and updates `record` to match.
    async fn mark_dropped(&mut self, record: &mut TrackedEmptyPartition)
    -> Result<(), SweepError>;
}
