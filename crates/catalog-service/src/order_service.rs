//! Order service trait definition.

use crate::dto::{OrderSubmission, TaskStatusResponse};
use async_trait::async_trait;
use catalog_core::{CatalogResult, OrderId};

/// Order service trait.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Enqueues a `process_order` task for `order_id`.
    async fn submit_order(&self, order_id: OrderId) -> CatalogResult<OrderSubmission>;

    /// Looks up a previously submitted task.
    async fn get_task_status(&self, task_id: &str) -> CatalogResult<TaskStatusResponse>;
}
