//! Health check controller.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use catalog_core::HealthStatus;
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy`, `degraded`, or `unhealthy`.
    pub status: String,
    /// Application version.
    pub version: String,
    /// Per-collaborator status keyed by check name.
    #[schema(value_type = Object)]
    pub checks: BTreeMap<String, HealthStatus>,
}

/// Creates the health router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/live", get(liveness_check))
}

async fn run_checks(state: &AppState) -> BTreeMap<String, HealthStatus> {
    let results = join_all(state.health_checks.iter().map(|check| async move {
        (check.name().to_string(), check.check().await)
    }))
    .await;
    results.into_iter().collect()
}

fn overall(checks: &BTreeMap<String, HealthStatus>) -> &'static str {
    if checks.values().any(HealthStatus::is_unhealthy) {
        "unhealthy"
    } else if checks.values().all(HealthStatus::is_healthy) {
        "healthy"
    } else {
        "degraded"
    }
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Collaborator health", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let checks = run_checks(&state).await;
    Json(HealthResponse {
        status: overall(&checks).to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks,
    })
}

/// Readiness check endpoint.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "health",
    responses(
        (status = 200, description = "Service is ready"),
        (status = 503, description = "A collaborator is unhealthy")
    )
)]
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let checks = run_checks(&state).await;
    if checks.values().any(HealthStatus::is_unhealthy) {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

/// Liveness check endpoint.
#[utoipa::path(
    get,
    path = "/live",
    tag = "health",
    responses(
        (status = 200, description = "Service is alive")
    )
)]
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}
