//! Product service trait definition.

use crate::dto::ProductListResponse;
use async_trait::async_trait;
use catalog_core::CatalogResult;

/// Product service trait.
#[async_trait]
pub trait ProductService: Send + Sync {
    /// Lists all products, from the cache when a fresh entry exists.
    async fn list_products(&self) -> CatalogResult<ProductListResponse>;
}
