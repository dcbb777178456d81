//! Service banner endpoint.

use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

/// Banner returned by `GET /`.
pub const BANNER: &str = "E-Commerce Backend Running";

/// Plain message response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Creates the root router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(root))
}

/// Reports that the service is up.
#[utoipa::path(
    get,
    path = "/",
    tag = "info",
    responses(
        (status = 200, description = "Service banner", body = MessageResponse)
    )
)]
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: BANNER.to_string(),
    })
}
