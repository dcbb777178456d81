//! OpenAPI documentation configuration.

use crate::controllers::{health_controller::HealthResponse, root_controller::MessageResponse};
use axum::{routing::get, Json, Router};
use catalog_core::{ErrorResponse, OrderId, Product, ProductId};
use catalog_service::{
    OrderSubmission, ProductListResponse, ProductSource, SubmitOrderRequest, TaskStatusResponse,
};
use utoipa::OpenApi;

use crate::state::AppState;

/// Path the OpenAPI document is served from.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// OpenAPI documentation for the catalog API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalog Cloud API",
        version = "1.0.0",
        description = "Product catalog with a cached listing and asynchronous order processing",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    paths(
        crate::controllers::root_controller::root,
        crate::controllers::product_controller::list_products,
        crate::controllers::order_controller::submit_order,
        crate::controllers::order_controller::get_task_status,
        crate::controllers::health_controller::health_check,
        crate::controllers::health_controller::readiness_check,
        crate::controllers::health_controller::liveness_check,
    ),
    components(
        schemas(
            ProductId,
            OrderId,
            Product,
            ErrorResponse,
            MessageResponse,
            HealthResponse,
            ProductSource,
            ProductListResponse,
            SubmitOrderRequest,
            OrderSubmission,
            TaskStatusResponse,
        )
    ),
    tags(
        (name = "info", description = "Service information"),
        (name = "products", description = "Product catalog"),
        (name = "orders", description = "Order processing tasks"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;

/// Creates the router serving the OpenAPI document.
pub fn router() -> Router<AppState> {
    Router::new().route(OPENAPI_PATH, get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
