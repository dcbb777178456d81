//! Integration tests for PgProductRepository.
//!
//! These tests run against a real PostgreSQL database using testcontainers.
//! Requires Docker; run with `cargo test -- --ignored`.

mod common;

use catalog_core::{CatalogError, Product};
use catalog_repository::{DatabasePool, PgProductRepository, ProductRepository};
use common::TestDatabase;
use std::sync::Arc;
use std::time::Duration;

fn repository(db: &TestDatabase) -> PgProductRepository {
    PgProductRepository::new(db.pool(), Duration::from_secs(5))
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_find_all_empty_table() {
    let db = TestDatabase::new().await;
    let products = repository(&db).find_all().await.expect("Query failed");
    assert!(products.is_empty());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_find_all_returns_rows_ordered_by_id() {
    let db = TestDatabase::new().await;
    db.insert_product(3, "Gizmo", "3.50").await;
    db.insert_product(1, "Widget", "9.99").await;
    db.insert_product(2, "Gadget", "19.50").await;

    let products = repository(&db).find_all().await.expect("Query failed");

    assert_eq!(
        products,
        vec![
            Product::new(1, "Widget", 9.99),
            Product::new(2, "Gadget", 19.5),
            Product::new(3, "Gizmo", 3.5),
        ]
    );
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_unreachable_database_is_data_source_error() {
    let db = TestDatabase::new().await;
    let mut config = db.config().clone();
    config.port = 1;
    config.connect_timeout_secs = 1;

    let pool = DatabasePool::connect_lazy(&config).expect("Invalid config");
    let repo = PgProductRepository::new(Arc::new(pool), Duration::from_secs(5));

    let err = repo.find_all().await.unwrap_err();
    assert!(matches!(err, CatalogError::DataSource(_)));
}
