//! Repository trait definitions.

use async_trait::async_trait;
use catalog_core::{CatalogResult, ProductListing};

/// Read-only access to the product table.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Returns every product, ordered by id ascending.
    ///
    /// Fails with `CatalogError::DataSource` when the source is unreachable
    /// or the query fails.
    async fn find_all(&self) -> CatalogResult<ProductListing>;
}
