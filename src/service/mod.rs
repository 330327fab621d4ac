use std::sync::Arc;

use log::{debug, info, warn};

use crate::catalog::{ProbeOutcome, discover_tables, probe_partitions};
use crate::cleanup::{CleanupExecutor, DropReport, abandon};
use crate::conf::Config;
use crate::core::{Ident, SweepError};
use crate::db::{Database, Session};
use crate::tracking::TrackedEmptyPartition;

/// The four operations behind both the scheduler and the HTTP API.
///
/// Every operation can be re-run at any time: discovery only ever inserts
/// what is not tracked yet, and the drop sweep only looks at pending records.
pub struct PartitionService {
    db: Arc<dyn Database>,
    schema: Ident,
    lock_key: i64,
    cleanup: CleanupExecutor,
}

impl PartitionService {
    pub fn new(db: Arc<dyn Database>, config: &Config) -> Result<Self, SweepError> {
        let schema = Ident::new(&config.partitions.target_schema)?;
        let lock_key = config.database.lock_key;
        Ok(Self {
            db,
            cleanup: CleanupExecutor::new(
                schema.clone(),
                lock_key,
                config.cleanup.recheck_before_drop,
            ),
            schema,
            lock_key,
        })
    }

    pub fn schema(&self) -> &Ident {
        &self.schema
    }

    /// Records every base table of the target schema not tracked yet.
    /// Returns how many were newly recorded.
    pub async fn identify_tables(&self) -> Result<usize, SweepError> {
        info!("identifying tables in schema {}", self.schema);
        let mut session = self.db.begin().await?;
        match self.record_tables(session.as_mut()).await {
            Ok(count) => {
                session.commit().await?;
                info!("identified {count} new tables in schema {}", self.schema);
                Ok(count)
            }
            Err(e) => {
                abandon(session).await;
                Err(e)
            }
        }
    }

    async fn record_tables(&self, session: &mut dyn Session) -> Result<usize, SweepError> {
        session.lock_run(self.lock_key).await?;
        let mut count = 0;
        for table in discover_tables(&mut *session, &self.schema).await? {
            if session
                .record_table_if_absent(&table.name, self.schema.as_str(), table.has_partitions)
                .await?
            {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Probes the children of every tracked partitioned table and records
    /// the empty ones not tracked yet. Returns how many were newly recorded.
    pub async fn identify_empty_partitions(&self) -> Result<usize, SweepError> {
        info!("identifying empty partitions in schema {}", self.schema);
        let mut session = self.db.begin().await?;
        match self.record_empty_partitions(session.as_mut()).await {
            Ok(count) => {
                session.commit().await?;
                info!(
                    "identified {count} new empty partitions in schema {}",
                    self.schema
                );
                Ok(count)
            }
            Err(e) => {
                abandon(session).await;
                Err(e)
            }
        }
    }

    async fn record_empty_partitions(
        &self,
        session: &mut dyn Session,
    ) -> Result<usize, SweepError> {
        session.lock_run(self.lock_key).await?;
        let mut count = 0;
        for table in session.list_partitioned_tables(self.schema.as_str()).await? {
            let parent = match Ident::new(&table.table_name) {
                Ok(parent) => parent,
                Err(e) => {
                    warn!("skipping tracked table {:?}: {e}", table.table_name);
                    continue;
                }
            };

            for probe in probe_partitions(&mut *session, &self.schema, &parent).await? {
                if probe.outcome != ProbeOutcome::Empty {
                    continue;
                }
                if session
                    .record_empty_partition_if_absent(&table.table_name, &probe.name)
                    .await?
                {
                    debug!("tracking empty partition {}.{}", self.schema, probe.name);
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    /// Detaches and drops every pending empty partition. One partition
    /// failing does not stop the others; see the report for details.
    pub async fn drop_empty_partitions(&self) -> Result<DropReport, SweepError> {
        let report = self.cleanup.drop_pending(self.db.as_ref()).await?;
        info!(
            "dropped {} empty partitions in schema {} ({} skipped, {} failed)",
            report.dropped(),
            self.schema,
            report.skipped().count(),
            report.failed().count()
        );
        Ok(report)
    }

    pub async fn list_pending_drops(&self) -> Result<Vec<TrackedEmptyPartition>, SweepError> {
        let mut session = self.db.begin().await?;
        let pending = session.list_pending_drops().await;
        session.commit().await?;
        pending
    }
}
