use log::{error, info, warn};

use crate::catalog::is_empty;
use crate::core::{Ident, SweepError};
use crate::db::{Database, Session};
use crate::tracking::TrackedEmptyPartition;

use super::{DropOutcome, DropReport};

/// Drops every pending empty partition, each in its own transaction so one
/// failure never undoes or blocks the others.
pub struct CleanupExecutor {
    schema: Ident,
    lock_key: i64,
    recheck_before_drop: bool,
}

enum Attempt {
    Dropped,
    NotEmpty,
}

impl CleanupExecutor {
    pub fn new(schema: Ident, lock_key: i64, recheck_before_drop: bool) -> Self {
        Self {
            schema,
            lock_key,
            recheck_before_drop,
        }
    }

    /// Fails only if the pending list itself cannot be read.
    pub async fn drop_pending(&self, db: &dyn Database) -> Result<DropReport, SweepError> {
        let pending = {
            let mut session = db.begin().await?;
            let pending = session.list_pending_drops().await;
            session.commit().await?;
            pending?
        };
        info!(
            "dropping {} pending empty partitions in {}",
            pending.len(),
            self.schema
        );

        let mut report = DropReport::default();
        for mut record in pending {
            let outcome = self.drop_one(db, &mut record).await;
            match &outcome {
                DropOutcome::Dropped => info!(
                    "dropped partition {}.{} of {}",
                    self.schema, record.partition_name, record.table_name
                ),
                DropOutcome::Skipped(reason) => warn!(
                    "skipped partition {}.{}: {reason}",
                    self.schema, record.partition_name
                ),
                DropOutcome::Failed(reason) => error!(
                    "error dropping partition {}.{}: {reason}",
                    self.schema, record.partition_name
                ),
            }
            report.push(&record.table_name, &record.partition_name, outcome);
        }
        Ok(report)
    }

    async fn drop_one(&self, db: &dyn Database, record: &mut TrackedEmptyPartition) -> DropOutcome {
        let (parent, partition) = match (
            Ident::new(&record.table_name),
            Ident::new(&record.partition_name),
        ) {
            (Ok(parent), Ok(partition)) => (parent, partition),
            (Err(e), _) | (_, Err(e)) => return DropOutcome::Skipped(e.to_string()),
        };

        let mut session = match db.begin().await {
            Ok(session) => session,
            Err(e) => return DropOutcome::Failed(e.to_string()),
        };

        match self
            .attempt(session.as_mut(), &parent, &partition, record)
            .await
        {
            Ok(Attempt::Dropped) => match session.commit().await {
                Ok(()) => DropOutcome::Dropped,
                Err(e) => {
                    // The record was updated before the commit failed.
                    record.is_dropped = false;
                    record.dropped_at = None;
                    DropOutcome::Failed(e.to_string())
                }
            },
            Ok(Attempt::NotEmpty) => {
                abandon(session).await;
                DropOutcome::Skipped("partition is no longer empty".to_string())
            }
            Err(e) => {
                abandon(session).await;
                DropOutcome::Failed(e.to_string())
            }
        }
    }

    async fn attempt(
        &self,
        session: &mut dyn Session,
        parent: &Ident,
        partition: &Ident,
        record: &mut TrackedEmptyPartition,
    ) -> Result<Attempt, SweepError> {
        session.lock_run(self.lock_key).await?;

        if self.recheck_before_drop {
            session.lock_partition(&self.schema, partition).await?;
            if !is_empty(&mut *session, &self.schema, partition).await? {
                return Ok(Attempt::NotEmpty);
            }
        }

        session
            .detach_partition(&self.schema, parent, partition)
            .await?;
        session.drop_table(&self.schema, partition).await?;
        session.mark_dropped(record).await?;
        Ok(Attempt::Dropped)
    }
}

/// Rolls back, logging instead of failing: the outcome is already decided.
pub(crate) async fn abandon(session: Box<dyn Session>) {
    if let Err(e) = session.rollback().await {
        warn!("rollback failed: {e}");
    }
}
