//! PostgreSQL product repository implementation.

use crate::{traits::ProductRepository, DatabasePoolInterface};
use async_trait::async_trait;
use catalog_core::{CatalogError, CatalogResult, Product, ProductListing};
use sqlx::FromRow;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Listing query. `price` is `NUMERIC(10,2)` in storage and is read back
/// as `DOUBLE PRECISION`.
pub const SELECT_ALL_PRODUCTS: &str =
    "SELECT id, name, price::DOUBLE PRECISION AS price FROM products ORDER BY id";

/// PostgreSQL product repository.
#[derive(Clone)]
pub struct PgProductRepository {
    pool: Arc<dyn DatabasePoolInterface>,
    query_timeout: Duration,
}

impl PgProductRepository {
    /// Creates a new repository whose queries are bounded by `query_timeout`.
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }
}

/// Database row representation of a product.
#[derive(Debug, FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    price: f64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product::new(row.id, row.name, row.price)
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn find_all(&self) -> CatalogResult<ProductListing> {
        let query = sqlx::query_as::<_, ProductRow>(SELECT_ALL_PRODUCTS).fetch_all(self.pool.inner());

        let rows = tokio::time::timeout(self.query_timeout, query)
            .await
            .map_err(|_| {
                warn!(timeout_ms = self.query_timeout.as_millis(), "Product query timed out");
                CatalogError::data_source(format!(
                    "query timed out after {}ms",
                    self.query_timeout.as_millis()
                ))
            })??;

        debug!(count = rows.len(), "Loaded products from database");
        Ok(rows.into_iter().map(Product::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_conversion() {
        let product = Product::from(ProductRow {
            id: 7,
            name: "Widget".to_string(),
            price: 9.99,
        });
        assert_eq!(product, Product::new(7, "Widget", 9.99));
    }

    #[test]
    fn test_listing_query_is_ordered_by_id() {
        assert!(SELECT_ALL_PRODUCTS.ends_with("ORDER BY id"));
        assert!(SELECT_ALL_PRODUCTS.contains("FROM products"));
    }
}
