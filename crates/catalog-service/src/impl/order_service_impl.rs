//! Order task submission.

use crate::dto::{OrderSubmission, TaskStatusResponse};
use crate::order_service::OrderService;
use crate::orders::ProcessOrderJob;
use async_trait::async_trait;
use catalog_core::{CatalogError, CatalogResult, OrderId};
use catalog_jobs::{Job, JobId, JobQueue, JobQueueExt};
use catalog_resilience::with_timeout;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Order service publishing to the task broker.
pub struct OrderServiceImpl {
    queue: Arc<dyn JobQueue>,
    broker_timeout: Duration,
}

impl OrderServiceImpl {
    /// Creates a new order service.
    pub fn new(queue: Arc<dyn JobQueue>, broker_timeout: Duration) -> Self {
        Self {
            queue,
            broker_timeout,
        }
    }
}

fn broker_error(error: CatalogError) -> CatalogError {
    match error {
        CatalogError::Timeout(message) => CatalogError::BrokerUnavailable(message),
        other => other,
    }
}

#[async_trait]
impl OrderService for OrderServiceImpl {
    async fn submit_order(&self, order_id: OrderId) -> CatalogResult<OrderSubmission> {
        if !order_id.is_valid() {
            return Err(CatalogError::validation(format!(
                "order_id must be a positive integer, got {order_id}"
            )));
        }

        let job = ProcessOrderJob::new(order_id);
        let task_id = with_timeout(self.broker_timeout, move || async move {
            self.queue.enqueue(job).await.map_err(CatalogError::from)
        })
        .await
        .map_err(broker_error)?;

        info!(task_id = %task_id, order_id = %order_id, "Order task queued");
        Ok(OrderSubmission::queued(&task_id, ProcessOrderJob::NAME, order_id))
    }

    async fn get_task_status(&self, task_id: &str) -> CatalogResult<TaskStatusResponse> {
        debug!(task_id, "Looking up task");

        let job_id = JobId::from(task_id);
        let info = with_timeout(self.broker_timeout, move || async move {
            self.queue.get_job(&job_id).await.map_err(CatalogError::from)
        })
        .await
        .map_err(broker_error)?
        .ok_or_else(|| CatalogError::not_found("Task", task_id))?;

        Ok(TaskStatusResponse::from(info))
    }
}
