//! End-to-end properties of the discovery and cleanup cycle.

use std::sync::Arc;

use rstest::rstest;

use partsweep::conf::Config;
use partsweep::service::PartitionService;
use partsweep::testutil::MemoryDatabase;

const SCHEMA: &str = "CADS";

fn service(db: &MemoryDatabase, recheck: bool) -> PartitionService {
    let mut config = Config::default();
    config.partitions.target_schema = SCHEMA.to_string();
    config.cleanup.recheck_before_drop = recheck;
    PartitionService::new(Arc::new(db.clone()), &config).unwrap()
}

fn sample_database() -> MemoryDatabase {
    let db = MemoryDatabase::new();
    db.add_table(SCHEMA, "customers", 42);
    db.add_partitioned(SCHEMA, "orders", &[("orders_a", 0), ("orders_b", 3)]);
    db.add_partitioned(SCHEMA, "events", &[("events_q1", 0), ("events_q2", 0)]);
    db.add_partitioned("staging", "orders", &[("orders_a", 0)]);
    db
}

#[tokio::test]
async fn test_identify_tables_twice() {
    let db = sample_database();
    let svc = service(&db, true);

    let first = svc.identify_tables().await.unwrap();
    let tracked = db.tracked_tables();
    let second = svc.identify_tables().await.unwrap();

    assert_eq!(first, 7);
    assert_eq!(second, 0);
    assert_eq!(db.tracked_tables(), tracked);
    assert!(tracked.iter().all(|t| t.schema_name == SCHEMA));
}

#[tokio::test]
async fn test_identify_empty_partitions_twice() {
    let db = sample_database();
    let svc = service(&db, true);
    svc.identify_tables().await.unwrap();

    assert_eq!(svc.identify_empty_partitions().await.unwrap(), 3);
    let tracked = db.tracked_partitions();
    assert_eq!(svc.identify_empty_partitions().await.unwrap(), 0);
    assert_eq!(db.tracked_partitions(), tracked);
}

#[tokio::test]
async fn test_only_empty_children_are_recorded() {
    let db = MemoryDatabase::new();
    db.add_partitioned(SCHEMA, "parent", &[("A", 0), ("B", 3)]);
    let svc = service(&db, true);

    svc.identify_tables().await.unwrap();
    svc.identify_empty_partitions().await.unwrap();

    let tracked = db.tracked_partitions();
    assert_eq!(tracked.len(), 1);
    assert_eq!(tracked[0].table_name, "parent");
    assert_eq!(tracked[0].partition_name, "A");
    assert!(!tracked[0].is_dropped);
    assert!(tracked[0].dropped_at.is_none());
}

#[tokio::test]
async fn test_vanished_partition_is_skipped_not_fatal() {
    let db = MemoryDatabase::new();
    db.add_partitioned(SCHEMA, "orders", &[("orders_a", 0), ("orders_b", 0)]);
    db.fail_probe("orders_a");
    let svc = service(&db, true);

    svc.identify_tables().await.unwrap();
    assert_eq!(svc.identify_empty_partitions().await.unwrap(), 1);
    assert_eq!(db.tracked_partitions()[0].partition_name, "orders_b");
}

#[tokio::test]
async fn test_drop_marks_record() {
    let db = MemoryDatabase::new();
    db.add_partitioned(SCHEMA, "orders", &[("A", 0)]);
    let svc = service(&db, true);
    svc.identify_tables().await.unwrap();
    svc.identify_empty_partitions().await.unwrap();

    let report = svc.drop_empty_partitions().await.unwrap();

    assert_eq!(report.dropped(), 1);
    let record = &db.tracked_partitions()[0];
    assert!(record.is_dropped);
    assert!(record.dropped_at.is_some());
    assert!(!db.relation_exists(SCHEMA, "A"));
    assert!(db.relation_exists(SCHEMA, "orders"));
}

#[rstest]
#[case::recheck(true)]
#[case::no_recheck(false)]
#[tokio::test]
async fn test_drop_isolation(#[case] recheck: bool) {
    let db = MemoryDatabase::new();
    db.add_partitioned(SCHEMA, "orders", &[("A", 0), ("B", 0)]);
    let svc = service(&db, recheck);
    svc.identify_tables().await.unwrap();
    svc.identify_empty_partitions().await.unwrap();
    db.reject_detach("B");

    let report = svc.drop_empty_partitions().await.unwrap();

    assert_eq!(report.dropped(), 1);
    let records = db.tracked_partitions();
    let a = records.iter().find(|p| p.partition_name == "A").unwrap();
    let b = records.iter().find(|p| p.partition_name == "B").unwrap();
    assert!(a.is_dropped);
    assert!(!b.is_dropped);
    assert!(b.dropped_at.is_none());
    assert!(db.is_attached(SCHEMA, "B"));
}

#[tokio::test]
async fn test_out_of_band_drop_stays_pending() {
    let db = MemoryDatabase::new();
    db.add_partitioned(SCHEMA, "orders", &[("A", 0), ("B", 0)]);
    let svc = service(&db, false);
    svc.identify_tables().await.unwrap();
    svc.identify_empty_partitions().await.unwrap();
    db.remove_relation(SCHEMA, "B");

    let report = svc.drop_empty_partitions().await.unwrap();

    assert_eq!(report.dropped(), 1);
    assert_eq!(report.failed().count(), 1);
    let pending = svc.list_pending_drops().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].partition_name, "B");
}

#[tokio::test]
async fn test_failed_drop_is_retried_next_sweep() {
    let db = MemoryDatabase::new();
    db.add_partitioned(SCHEMA, "orders", &[("A", 0)]);
    let svc = service(&db, true);
    svc.identify_tables().await.unwrap();
    svc.identify_empty_partitions().await.unwrap();

    db.set_rows(SCHEMA, "A", 2);
    assert_eq!(svc.drop_empty_partitions().await.unwrap().dropped(), 0);

    db.set_rows(SCHEMA, "A", 0);
    assert_eq!(svc.drop_empty_partitions().await.unwrap().dropped(), 1);
    assert!(svc.list_pending_drops().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_every_operation_stays_in_schema() {
    let db = sample_database();
    db.add_table("public", "unrelated", 0);
    let svc = service(&db, true);

    svc.identify_tables().await.unwrap();
    svc.identify_empty_partitions().await.unwrap();
    svc.drop_empty_partitions().await.unwrap();
    svc.list_pending_drops().await.unwrap();

    assert_eq!(db.schemas_touched(), vec![SCHEMA.to_string()]);
    assert!(db.relation_exists("staging", "orders_a"));
    assert!(db.relation_exists("public", "unrelated"));
}

#[tokio::test]
async fn test_pending_list_never_contains_dropped() {
    let db = sample_database();
    let svc = service(&db, true);
    svc.identify_tables().await.unwrap();
    svc.identify_empty_partitions().await.unwrap();
    db.reject_detach("events_q2");
    svc.drop_empty_partitions().await.unwrap();

    let pending = svc.list_pending_drops().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert!(pending.iter().all(|p| !p.is_dropped && p.dropped_at.is_none()));
}
