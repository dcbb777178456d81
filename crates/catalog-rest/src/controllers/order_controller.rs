//! Order submission controller.

use crate::{
    responses::{accepted, ok, ApiResult, AppError},
    state::AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use catalog_core::CatalogError;
use catalog_service::{OrderSubmission, SubmitOrderRequest, TaskStatusResponse};
use tracing::debug;

/// Creates the order router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", post(submit_order))
        .route("/orders/tasks/:task_id", get(get_task_status))
}

/// Queue an order for processing.
#[utoipa::path(
    post,
    path = "/orders",
    tag = "orders",
    request_body = SubmitOrderRequest,
    responses(
        (status = 202, description = "Order task queued", body = OrderSubmission),
        (status = 400, description = "Invalid order id", body = catalog_core::ErrorResponse),
        (status = 503, description = "Task broker unavailable", body = catalog_core::ErrorResponse)
    )
)]
pub async fn submit_order(
    State(state): State<AppState>,
    payload: Result<Json<SubmitOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderSubmission>), AppError> {
    let Json(request) = payload.map_err(|e| CatalogError::validation(e.body_text()))?;
    debug!(order_id = %request.order_id, "Submit order request");

    let submission = state.order_service.submit_order(request.order_id).await?;
    Ok(accepted(submission))
}

/// Get the status of a submitted order task.
#[utoipa::path(
    get,
    path = "/orders/tasks/{task_id}",
    tag = "orders",
    params(
        ("task_id" = String, Path, description = "Task handle returned on submission")
    ),
    responses(
        (status = 200, description = "Task status", body = TaskStatusResponse),
        (status = 404, description = "Unknown task", body = catalog_core::ErrorResponse),
        (status = 503, description = "Task broker unavailable", body = catalog_core::ErrorResponse)
    )
)]
pub async fn get_task_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<TaskStatusResponse> {
    debug!(task_id = %task_id, "Task status request");

    let response = state.order_service.get_task_status(&task_id).await?;
    ok(response)
}
