//! Product entity.

use crate::ProductId;
use serde::{Deserialize, Serialize};

/// A catalog product as stored in the relational source.
///
/// Products are read-only from this service's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(deny_unknown_fields)]
pub struct Product {
    /// Unique, stable identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: f64,
}

impl Product {
    /// Creates a new product.
    #[must_use]
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
        }
    }
}

/// All products currently in the relational source, ordered by id.
pub type ProductListing = Vec<Product>;
