//! Product listing controller.

use crate::{
    responses::{ok, ApiResult},
    state::AppState,
};
use axum::{extract::State, routing::get, Router};
use catalog_service::ProductListResponse;
use tracing::debug;

/// Creates the product router.
pub fn router() -> Router<AppState> {
    Router::new().route("/products", get(list_products))
}

/// List all products.
///
/// `source` tells whether the listing came from the cache or the database.
#[utoipa::path(
    get,
    path = "/products",
    tag = "products",
    responses(
        (status = 200, description = "Product listing", body = ProductListResponse),
        (status = 500, description = "Product source unavailable", body = catalog_core::ErrorResponse)
    )
)]
pub async fn list_products(State(state): State<AppState>) -> ApiResult<ProductListResponse> {
    let response = state.product_service.list_products().await?;
    debug!(
        source = ?response.source,
        count = response.products.len(),
        "List products request"
    );
    ok(response)
}
