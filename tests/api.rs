use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use partsweep::api::PartitionApi;
use partsweep::conf::Config;
use partsweep::service::PartitionService;
use partsweep::testutil::MemoryDatabase;

fn setup(db: &MemoryDatabase) -> Router {
    let mut config = Config::default();
    config.partitions.target_schema = "CADS".to_string();
    let service = PartitionService::new(Arc::new(db.clone()), &config).unwrap();
    PartitionApi::new(Arc::new(service)).router()
}

async fn body_bytes(router: Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, bytes)
}

async fn body_json(router: Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = body_bytes(router, req).await;
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

fn post(uri: &str) -> Request<Body> {
    Request::post(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let router = setup(&MemoryDatabase::new());
    let req = Request::get("/health").body(Body::empty()).unwrap();
    let (status, bytes) = body_bytes(router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"OK");
}

#[tokio::test]
async fn test_full_cycle() {
    let db = MemoryDatabase::new();
    db.add_partitioned(
        "CADS",
        "orders",
        &[("orders_2024_01", 0), ("orders_2024_02", 8)],
    );
    let router = setup(&db);

    // 1. Identify tables
    let (status, json) = body_json(router.clone(), post("/api/partitions/identify-tables")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Tables identification completed");
    assert_eq!(json["tablesIdentified"], 3);

    // 2. Identify empty partitions
    let (status, json) = body_json(
        router.clone(),
        post("/api/partitions/identify-empty-partitions"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["emptyPartitionsIdentified"], 1);

    // 3. List pending drops
    let req = Request::get("/api/partitions/empty-partitions")
        .body(Body::empty())
        .unwrap();
    let (status, json) = body_json(router.clone(), req).await;
    assert_eq!(status, StatusCode::OK);
    let pending = json.as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["tableName"], "orders");
    assert_eq!(pending[0]["partitionName"], "orders_2024_01");
    assert_eq!(pending[0]["isDropped"], false);
    assert!(pending[0]["droppedAt"].is_null());
    assert!(pending[0]["identifiedAt"].is_string());

    // 4. Drop
    let (status, json) = body_json(
        router.clone(),
        post("/api/partitions/drop-empty-partitions"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Empty partitions drop completed");
    assert_eq!(json["partitionsDropped"], 1);
    assert_eq!(json["failed"].as_array().unwrap().len(), 0);
    assert!(!db.relation_exists("CADS", "orders_2024_01"));

    // 5. Nothing left pending
    let req = Request::get("/api/partitions/empty-partitions")
        .body(Body::empty())
        .unwrap();
    let (_, json) = body_json(router, req).await;
    assert_eq!(json.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_drop_reports_failures() {
    let db = MemoryDatabase::new();
    db.add_partitioned("CADS", "orders", &[("orders_a", 0), ("orders_b", 0)]);
    db.seed_pending("orders", "orders_a");
    db.seed_pending("orders", "orders_b");
    db.reject_detach("orders_b");
    let router = setup(&db);

    let (status, json) = body_json(router, post("/api/partitions/drop-empty-partitions")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["partitionsDropped"], 1);
    let failed = json["failed"].as_array().unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0]["partitionName"], "orders_b");
    assert_eq!(failed[0]["outcome"]["status"], "failed");
}

#[tokio::test]
async fn test_database_failure_maps_to_error_body() {
    let db = MemoryDatabase::new();
    db.fail_listing(true);
    let router = setup(&db);

    let (status, json) = body_json(router, post("/api/partitions/identify-tables")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(json["error"].as_str().unwrap().starts_with("Database error"));
}

#[tokio::test]
async fn test_identify_requires_post() {
    let router = setup(&MemoryDatabase::new());
    let req = Request::get("/api/partitions/identify-tables")
        .body(Body::empty())
        .unwrap();
    let (status, _) = body_bytes(router, req).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
