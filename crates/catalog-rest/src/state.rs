//! Application state for Axum handlers.

use catalog_core::HealthCheck;
use catalog_service::{OrderService, ProductService};
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub product_service: Arc<dyn ProductService>,
    pub order_service: Arc<dyn OrderService>,
    pub health_checks: Arc<[Arc<dyn HealthCheck>]>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        product_service: Arc<dyn ProductService>,
        order_service: Arc<dyn OrderService>,
        health_checks: Vec<Arc<dyn HealthCheck>>,
    ) -> Self {
        Self {
            product_service,
            order_service,
            health_checks: health_checks.into(),
        }
    }
}
