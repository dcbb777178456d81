//! Cache keys and expiry for cached collections.

use std::time::Duration;

/// Key holding the full product listing.
pub const PRODUCTS: &str = "products";

/// Lifetime of a cached product listing.
pub const PRODUCTS_TTL: Duration = Duration::from_secs(30);
