use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Config as PoolConfigBuilder, Object, Pool, PoolConfig, Runtime};
use log::{debug, info, warn};
use tokio_postgres::{NoTls, Row};

use crate::catalog::CatalogReader;
use crate::cleanup::PartitionDdl;
use crate::conf::DatabaseConfig;
use crate::core::{Ident, SweepError};
use crate::tracking::{TrackedEmptyPartition, TrackedTable, TrackingStore};

use super::sql::{self, TrackingSql};
use super::{Database, Session};

/// PostgreSQL behind a deadpool connection pool.
pub struct PgDatabase {
    pool: Pool,
    tracking: TrackingSql,
}

impl PgDatabase {
    pub async fn connect(
        config: &DatabaseConfig,
        tracking_schema: &Ident,
    ) -> Result<Self, SweepError> {
        let mut cfg = PoolConfigBuilder::new();
        cfg.host = Some(config.host.clone());
        cfg.port = Some(config.port);
        cfg.user = Some(config.user.clone());
        cfg.password = Some(config.password.clone());
        cfg.dbname = Some(config.dbname.clone());
        cfg.connect_timeout = Some(config.connect_timeout);
        cfg.pool = Some(PoolConfig::new(config.max_connections));

        debug!(
            "creating connection pool for {}:{}/{} (max {} connections)",
            config.host, config.port, config.dbname, config.max_connections
        );
        let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls)?;

        let client = pool.get().await?;
        client.execute("SELECT 1", &[]).await?;
        info!(
            "connected to postgres at {}:{}/{}",
            config.host, config.port, config.dbname
        );

        Ok(Self {
            pool,
            tracking: TrackingSql::new(tracking_schema),
        })
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn begin(&self) -> Result<Box<dyn Session>, SweepError> {
        let client = self.pool.get().await?;
        client.batch_execute("START TRANSACTION").await?;
        Ok(Box::new(PgSession {
            client: Some(client),
            sql: self.tracking.clone(),
        }))
    }
}

pub struct PgSession {
    client: Option<Object>,
    sql: TrackingSql,
}

impl PgSession {
    fn client(&self) -> Result<&Object, SweepError> {
        self.client.as_ref().ok_or(SweepError::TransactionClosed)
    }

    async fn finish(&mut self, statement: &str) -> Result<(), SweepError> {
        let client = self.client.take().ok_or(SweepError::TransactionClosed)?;
        match client.batch_execute(statement).await {
            Ok(()) => Ok(()),
            Err(e) => {
                // Keep a connection in an unknown state out of the pool.
                let _ = Object::take(client);
                Err(e.into())
            }
        }
    }
}

impl Drop for PgSession {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            warn!("transaction dropped while open, discarding its connection");
            let _ = Object::take(client);
        }
    }
}

fn tracked_table(row: &Row) -> Result<TrackedTable, SweepError> {
    Ok(TrackedTable {
        id: row.try_get("id")?,
        table_name: row.try_get("table_name")?,
        schema_name: row.try_get("table_schema")?,
        has_partitions: row.try_get("has_partitions")?,
    })
}

fn tracked_partition(row: &Row) -> Result<TrackedEmptyPartition, SweepError> {
    Ok(TrackedEmptyPartition {
        id: row.try_get("id")?,
        table_name: row.try_get("table_name")?,
        partition_name: row.try_get("partition_name")?,
        identified_at: row.try_get("identified_at")?,
        is_dropped: row.try_get("is_dropped")?,
        dropped_at: row.try_get("dropped_at")?,
    })
}

#[async_trait]
impl CatalogReader for PgSession {
    async fn list_base_tables(&mut self, schema: &Ident) -> Result<Vec<String>, SweepError> {
        let rows = self
            .client()?
            .query(sql::LIST_BASE_TABLES, &[&schema.as_str()])
            .await?;
        rows.iter()
            .map(|row| row.try_get(0).map_err(SweepError::from))
            .collect()
    }

    async fn has_partitions(&mut self, schema: &Ident, table: &str) -> Result<bool, SweepError> {
        let row = self
            .client()?
            .query_one(sql::HAS_PARTITIONS, &[&schema.as_str(), &table])
            .await?;
        Ok(row.try_get(0)?)
    }

    async fn list_child_partitions(
        &mut self,
        schema: &Ident,
        parent: &str,
    ) -> Result<Vec<String>, SweepError> {
        let rows = self
            .client()?
            .query(sql::LIST_CHILD_PARTITIONS, &[&schema.as_str(), &parent])
            .await?;
        rows.iter()
            .map(|row| row.try_get("partition_name").map_err(SweepError::from))
            .collect()
    }

    async fn count_rows(&mut self, schema: &Ident, relation: &Ident) -> Result<i64, SweepError> {
        let client = self.client()?;
        client.batch_execute(sql::PROBE_SAVEPOINT).await?;
        match client.query_one(&sql::count_rows(schema, relation), &[]).await {
            Ok(row) => {
                client.batch_execute(sql::RELEASE_PROBE).await?;
                Ok(row.try_get(0)?)
            }
            Err(e) => {
                client.batch_execute(sql::ROLLBACK_PROBE).await?;
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl TrackingStore for PgSession {
    async fn record_table_if_absent(
        &mut self,
        table_name: &str,
        schema: &str,
        has_partitions: bool,
    ) -> Result<bool, SweepError> {
        let inserted = self
            .client()?
            .query_opt(&self.sql.insert_table, &[&table_name, &schema, &has_partitions])
            .await?;
        Ok(inserted.is_some())
    }

    async fn list_partitioned_tables(
        &mut self,
        schema: &str,
    ) -> Result<Vec<TrackedTable>, SweepError> {
        let rows = self
            .client()?
            .query(&self.sql.list_partitioned_tables, &[&schema])
            .await?;
        rows.iter().map(tracked_table).collect()
    }

    async fn record_empty_partition_if_absent(
        &mut self,
        table_name: &str,
        partition_name: &str,
    ) -> Result<bool, SweepError> {
        let inserted = self
            .client()?
            .query_opt(&self.sql.insert_empty_partition, &[&table_name, &partition_name])
            .await?;
        Ok(inserted.is_some())
    }

    async fn list_pending_drops(&mut self) -> Result<Vec<TrackedEmptyPartition>, SweepError> {
        let rows = self
            .client()?
            .query(&self.sql.list_pending_drops, &[])
            .await?;
        rows.iter().map(tracked_partition).collect()
    }

    async fn mark_dropped(
        &mut self,
        record: &mut TrackedEmptyPartition,
    ) -> Result<(), SweepError> {
        let row = self
            .client()?
            .query_opt(&self.sql.mark_dropped, &[&record.id])
            .await?
            .ok_or_else(|| {
                SweepError::DatabaseError(format!(
                    "empty partition record {} is missing or already dropped",
                    record.id
                ))
            })?;
        let dropped_at: DateTime<Utc> = row.try_get("dropped_at")?;
        record.mark_dropped(dropped_at);
        Ok(())
    }
}

#[async_trait]
impl PartitionDdl for PgSession {
    async fn lock_partition(
        &mut self,
        schema: &Ident,
        partition: &Ident,
    ) -> Result<(), SweepError> {
        self.client()?
            .batch_execute(&sql::lock_table(schema, partition))
            .await?;
        Ok(())
    }

    async fn detach_partition(
        &mut self,
        schema: &Ident,
        parent: &Ident,
        partition: &Ident,
    ) -> Result<(), SweepError> {
        self.client()?
            .batch_execute(&sql::detach_partition(schema, parent, partition))
            .await?;
        Ok(())
    }

    async fn drop_table(&mut self, schema: &Ident, table: &Ident) -> Result<(), SweepError> {
        self.client()?
            .batch_execute(&sql::drop_table(schema, table))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Session for PgSession {
    async fn lock_run(&mut self, key: i64) -> Result<(), SweepError> {
        self.client()?
            .execute(sql::ADVISORY_XACT_LOCK, &[&key])
            .await?;
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<(), SweepError> {
        self.finish("COMMIT").await
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), SweepError> {
        self.finish("ROLLBACK").await
    }
}
