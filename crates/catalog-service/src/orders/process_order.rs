//! The `process_order` task.

use async_trait::async_trait;
use catalog_core::OrderId;
use catalog_jobs::{Job, JobContext, JobError};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Processes a single order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOrderJob {
    pub order_id: OrderId,
}

impl ProcessOrderJob {
    #[must_use]
    pub const fn new(order_id: OrderId) -> Self {
        Self { order_id }
    }
}

#[async_trait]
impl Job for ProcessOrderJob {
    const NAME: &'static str = "process_order";
    const QUEUE: &'static str = "orders";
    const MAX_RETRIES: u32 = 3;
    const TIMEOUT_SECS: u64 = 60;

    async fn execute(&self, ctx: JobContext) -> Result<String, JobError> {
        info!(
            order_id = %self.order_id,
            job_id = %ctx.job_id,
            attempt = ctx.attempt,
            "Processing order"
        );
        Ok(format!("Order {} processed!", self.order_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_jobs::JobData;

    #[tokio::test]
    async fn test_execute_returns_marker() {
        let job = ProcessOrderJob::new(OrderId(42));
        let mut data = JobData::new(&job).unwrap();
        data.begin_attempt();

        let result = job.execute(data.to_context("worker-1")).await.unwrap();
        assert_eq!(result, "Order 42 processed!");
    }

    #[test]
    fn test_descriptor() {
        let data = JobData::new(&ProcessOrderJob::new(OrderId(42))).unwrap();
        assert_eq!(data.name, "process_order");
        assert_eq!(data.queue, "orders");
        assert_eq!(data.payload, r#"{"order_id":42}"#);
        assert_eq!(data.max_attempts, 4);
    }
}
