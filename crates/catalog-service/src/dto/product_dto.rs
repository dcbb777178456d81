//! Product listing DTOs.

use catalog_core::{Product, ProductListing};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Where a product listing was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProductSource {
    /// Served from the cache entry.
    Cache,
    /// Read from the relational source.
    Database,
}

/// Response for the product listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductListResponse {
    pub source: ProductSource,
    #[schema(value_type = Vec<Product>)]
    pub products: ProductListing,
}

impl ProductListResponse {
    #[must_use]
    pub const fn from_cache(products: ProductListing) -> Self {
        Self {
            source: ProductSource::Cache,
            products,
        }
    }

    #[must_use]
    pub const fn from_database(products: ProductListing) -> Self {
        Self {
            source: ProductSource::Database,
            products,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_json_shape() {
        let response = ProductListResponse::from_database(vec![Product::new(1, "Widget", 9.99)]);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "source": "database",
                "products": [{"id": 1, "name": "Widget", "price": 9.99}]
            })
        );
    }

    #[test]
    fn test_source_names() {
        assert_eq!(serde_json::to_string(&ProductSource::Cache).unwrap(), r#""cache""#);
        assert_eq!(
            serde_json::to_string(&ProductSource::Database).unwrap(),
            r#""database""#
        );
    }
}
