//! Test utilities.
//!
//! This module is only available in tests or when the `testutil` feature is
//! enabled. [`MemoryDatabase`] stands in for PostgreSQL: it keeps a catalog of
//! relations and the two tracking sets, gives every session a private copy
//! that only becomes visible on commit, records which schemas the catalog
//! and DDL calls touched, and can be told to fail specific operations.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::catalog::CatalogReader;
use crate::cleanup::PartitionDdl;
use crate::core::{Ident, SweepError};
use crate::db::{Database, Session};
use crate::tracking::{TrackedEmptyPartition, TrackedTable, TrackingStore};

#[derive(Debug, Clone)]
struct Relation {
    rows: i64,
    parent: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct State {
    relations: BTreeMap<(String, String), Relation>,
    tables: Vec<TrackedTable>,
    partitions: Vec<TrackedEmptyPartition>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_pending(&mut self, table_name: &str, partition_name: &str) -> bool {
        if self
            .partitions
            .iter()
            .any(|p| p.table_name == table_name && p.partition_name == partition_name)
        {
            return false;
        }
        let id = self.next_id();
        self.partitions.push(TrackedEmptyPartition {
            id,
            table_name: table_name.to_string(),
            partition_name: partition_name.to_string(),
            identified_at: Utc::now(),
            is_dropped: false,
            dropped_at: None,
        });
        true
    }
}

#[derive(Debug, Default)]
struct Faults {
    fail_listing: bool,
    fail_probe: HashSet<String>,
    reject_detach: HashSet<String>,
}

#[derive(Debug, Default)]
struct Inner {
    state: State,
    faults: Faults,
    touched: BTreeSet<String>,
    commits: usize,
    rollbacks: usize,
}

/// In-memory [`Database`]. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    inner: Arc<Mutex<Inner>>,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|e| e.into_inner())
}

fn key(schema: &str, name: &str) -> (String, String) {
    (schema.to_string(), name.to_string())
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock(&self.inner)
    }

    /// Adds a plain base table holding `rows` rows.
    pub fn add_table(&self, schema: &str, name: &str, rows: i64) {
        self.lock()
            .state
            .relations
            .insert(key(schema, name), Relation { rows, parent: None });
    }

    /// Adds a partitioned parent and its attached children with their row counts.
    pub fn add_partitioned(&self, schema: &str, parent: &str, children: &[(&str, i64)]) {
        let mut inner = self.lock();
        inner.state.relations.insert(
            key(schema, parent),
            Relation {
                rows: 0,
                parent: None,
            },
        );
        for (child, rows) in children {
            inner.state.relations.insert(
                key(schema, child),
                Relation {
                    rows: *rows,
                    parent: Some(parent.to_string()),
                },
            );
        }
    }

    pub fn set_rows(&self, schema: &str, name: &str, rows: i64) {
        if let Some(relation) = self.lock().state.relations.get_mut(&key(schema, name)) {
            relation.rows = rows;
        }
    }

    /// Drops a relation behind the sweeper's back.
    pub fn remove_relation(&self, schema: &str, name: &str) {
        self.lock().state.relations.remove(&key(schema, name));
    }

    /// Tracks `partition` of `table` as a pending empty partition.
    pub fn seed_pending(&self, table: &str, partition: &str) {
        self.lock().state.insert_pending(table, partition);
    }

    /// Makes every listing query (catalog and pending drops) fail.
    pub fn fail_listing(&self, fail: bool) {
        self.lock().faults.fail_listing = fail;
    }

    /// Makes the row-count probe of `relation` fail.
    pub fn fail_probe(&self, relation: &str) {
        self.lock().faults.fail_probe.insert(relation.to_string());
    }

    /// Makes `DETACH PARTITION` of `partition` fail.
    pub fn reject_detach(&self, partition: &str) {
        self.lock().faults.reject_detach.insert(partition.to_string());
    }

    pub fn relation_exists(&self, schema: &str, name: &str) -> bool {
        self.lock().state.relations.contains_key(&key(schema, name))
    }

    pub fn is_attached(&self, schema: &str, name: &str) -> bool {
        self.lock()
            .state
            .relations
            .get(&key(schema, name))
            .is_some_and(|r| r.parent.is_some())
    }

    pub fn tracked_tables(&self) -> Vec<TrackedTable> {
        self.lock().state.tables.clone()
    }

    pub fn tracked_partitions(&self) -> Vec<TrackedEmptyPartition> {
        self.lock().state.partitions.clone()
    }

    /// Every schema named by a catalog query or DDL statement so far.
    pub fn schemas_touched(&self) -> Vec<String> {
        self.lock().touched.iter().cloned().collect()
    }

    pub fn commits(&self) -> usize {
        self.lock().commits
    }

    pub fn rollbacks(&self) -> usize {
        self.lock().rollbacks
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn begin(&self) -> Result<Box<dyn Session>, SweepError> {
        let state = self.lock().state.clone();
        Ok(Box::new(MemorySession {
            inner: Arc::clone(&self.inner),
            state,
        }))
    }
}

pub struct MemorySession {
    inner: Arc<Mutex<Inner>>,
    state: State,
}

impl MemorySession {
    fn touch(&self, schema: &Ident) {
        lock(&self.inner).touched.insert(schema.as_str().to_string());
    }

    fn check_listing(&self) -> Result<(), SweepError> {
        if lock(&self.inner).faults.fail_listing {
            return Err(SweepError::DatabaseError(
                "connection reset by peer".to_string(),
            ));
        }
        Ok(())
    }

    fn relation(&self, schema: &Ident, name: &str) -> Result<&Relation, SweepError> {
        self.state
            .relations
            .get(&key(schema.as_str(), name))
            .ok_or_else(|| missing(schema, name))
    }
}

fn missing(schema: &Ident, name: &str) -> SweepError {
    SweepError::DatabaseError(format!(
        "42P01: relation \"{schema}.{name}\" does not exist"
    ))
}

#[async_trait]
impl CatalogReader for MemorySession {
    async fn list_base_tables(&mut self, schema: &Ident) -> Result<Vec<String>, SweepError> {
        self.touch(schema);
        self.check_listing()?;
        Ok(self
            .state
            .relations
            .keys()
            .filter(|(s, _)| s == schema.as_str())
            .map(|(_, name)| name.clone())
            .collect())
    }

    async fn has_partitions(&mut self, schema: &Ident, table: &str) -> Result<bool, SweepError> {
        self.touch(schema);
        Ok(self
            .state
            .relations
            .iter()
            .any(|((s, _), r)| s == schema.as_str() && r.parent.as_deref() == Some(table)))
    }

    async fn list_child_partitions(
        &mut self,
        schema: &Ident,
        parent: &str,
    ) -> Result<Vec<String>, SweepError> {
        self.touch(schema);
        self.check_listing()?;
        Ok(self
            .state
            .relations
            .iter()
            .filter(|((s, _), r)| s == schema.as_str() && r.parent.as_deref() == Some(parent))
            .map(|((_, name), _)| name.clone())
            .collect())
    }

    async fn count_rows(&mut self, schema: &Ident, relation: &Ident) -> Result<i64, SweepError> {
        self.touch(schema);
        if lock(&self.inner).faults.fail_probe.contains(relation.as_str()) {
            return Err(missing(schema, relation.as_str()));
        }
        Ok(self.relation(schema, relation.as_str())?.rows)
    }
}

#[async_trait]
impl TrackingStore for MemorySession {
    async fn record_table_if_absent(
        &mut self,
        table_name: &str,
        schema: &str,
        has_partitions: bool,
    ) -> Result<bool, SweepError> {
        if self
            .state
            .tables
            .iter()
            .any(|t| t.table_name == table_name && t.schema_name == schema)
        {
            return Ok(false);
        }
        let id = self.state.next_id();
        self.state.tables.push(TrackedTable {
            id,
            table_name: table_name.to_string(),
            schema_name: schema.to_string(),
            has_partitions,
        });
        Ok(true)
    }

    async fn list_partitioned_tables(
        &mut self,
        schema: &str,
    ) -> Result<Vec<TrackedTable>, SweepError> {
        let mut tables: Vec<_> = self
            .state
            .tables
            .iter()
            .filter(|t| t.schema_name == schema && t.has_partitions)
            .cloned()
            .collect();
        tables.sort_by(|a, b| a.table_name.cmp(&b.table_name));
        Ok(tables)
    }

    async fn record_empty_partition_if_absent(
        &mut self,
        table_name: &str,
        partition_name: &str,
    ) -> Result<bool, SweepError> {
        Ok(self.state.insert_pending(table_name, partition_name))
    }

    async fn list_pending_drops(&mut self) -> Result<Vec<TrackedEmptyPartition>, SweepError> {
        self.check_listing()?;
        Ok(self
            .state
            .partitions
            .iter()
            .filter(|p| !p.is_dropped)
            .cloned()
            .collect())
    }

    async fn mark_dropped(
        &mut self,
        record: &mut TrackedEmptyPartition,
    ) -> Result<(), SweepError> {
        let stored = self
            .state
            .partitions
            .iter_mut()
            .find(|p| p.id == record.id && !p.is_dropped)
            .ok_or_else(|| {
                SweepError::DatabaseError(format!(
                    "empty partition record {} is missing or already dropped",
                    record.id
                ))
            })?;
        stored.mark_dropped(Utc::now());
        record.is_dropped = stored.is_dropped;
        record.dropped_at = stored.dropped_at;
        Ok(())
    }
}

#[async_trait]
impl PartitionDdl for MemorySession {
    async fn lock_partition(
        &mut self,
        schema: &Ident,
        partition: &Ident,
    ) -> Result<(), SweepError> {
        self.touch(schema);
        self.relation(schema, partition.as_str())?;
        Ok(())
    }

    async fn detach_partition(
        &mut self,
        schema: &Ident,
        parent: &Ident,
        partition: &Ident,
    ) -> Result<(), SweepError> {
        self.touch(schema);
        if lock(&self.inner)
            .faults
            .reject_detach
            .contains(partition.as_str())
        {
            return Err(SweepError::DatabaseError(format!(
                "55P03: could not obtain lock on relation \"{partition}\""
            )));
        }
        let relation = self
            .state
            .relations
            .get_mut(&key(schema.as_str(), partition.as_str()))
            .ok_or_else(|| missing(schema, partition.as_str()))?;
        if relation.parent.as_deref() != Some(parent.as_str()) {
            return Err(SweepError::DatabaseError(format!(
                "42P01: relation \"{partition}\" is not a partition of relation \"{parent}\""
            )));
        }
        relation.parent = None;
        Ok(())
    }

    async fn drop_table(&mut self, schema: &Ident, table: &Ident) -> Result<(), SweepError> {
        self.touch(schema);
        self.state
            .relations
            .remove(&key(schema.as_str(), table.as_str()))
            .map(|_| ())
            .ok_or_else(|| missing(schema, table.as_str()))
    }
}

#[async_trait]
impl Session for MemorySession {
    async fn lock_run(&mut self, _key: i64) -> Result<(), SweepError> {
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), SweepError> {
        let mut inner = lock(&self.inner);
        inner.state = self.state.clone();
        inner.commits += 1;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), SweepError> {
        lock(&self.inner).rollbacks += 1;
        Ok(())
    }
}
