//! Detach-then-drop of tracked empty partitions.

mod executor;
mod report;

use async_trait::async_trait;

use crate::core::{Ident, SweepError};

pub use executor::CleanupExecutor;
pub(crate) use executor::abandon;
pub use report::{DropEntry, DropOutcome, DropReport};

/// Destructive statements against the target schema.
#[async_trait]
pub trait PartitionDdl: Send {
    /// `LOCK TABLE ... IN ACCESS EXCLUSIVE MODE` for the rest of the transaction.
    async fn lock_partition(&mut self, schema: &Ident, partition: &Ident)
    -> Result<(), SweepError>;

    /// `ALTER TABLE parent DETACH PARTITION partition`
    async fn detach_partition(
        &mut self,
        schema: &Ident,
        parent: &Ident,
        partition: &Ident,
    ) -> Result<(), SweepError>;

    /// `DROP TABLE table`
    async fn drop_table(&mut self, schema: &Ident, table: &Ident) -> Result<(), SweepError>;
}
