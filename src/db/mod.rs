//! Transactional access to the database that holds both the partitions
//! being swept and the tracking tables.

mod postgres;
mod sql;

use async_trait::async_trait;

use crate::catalog::CatalogReader;
use crate::cleanup::PartitionDdl;
use crate::core::SweepError;
use crate::tracking::TrackingStore;

pub use postgres::PgDatabase;

#[async_trait]
pub trait Database: Send + Sync {
    /// Opens a transaction on a dedicated connection.
    async fn begin(&self) -> Result<Box<dyn Session>, SweepError>;
}

/// One open transaction. Dropping a session without calling `commit` or
/// `rollback` discards its work.
#[async_trait]
pub trait Session: CatalogReader + TrackingStore + PartitionDdl + Send {
    /// Waits for the transaction-scoped advisory lock `key`, which is held
    /// until the transaction ends.
    async fn lock_run(&mut self, key: i64) -> Result<(), SweepError>;

    async fn commit(self: Box<Self>) -> Result<(), SweepError>;

    async fn rollback(self: Box<Self>) -> Result<(), SweepError>;
}
