//! Order submission and task status DTOs.

use catalog_core::OrderId;
use catalog_jobs::{JobId, JobInfo};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Status reported for a freshly submitted task.
pub const QUEUED: &str = "queued";

/// Request to process an order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct SubmitOrderRequest {
    #[schema(value_type = i64, example = 42)]
    pub order_id: OrderId,
}

/// Handle returned after an order task was accepted by the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderSubmission {
    /// Task handle, usable with the task status endpoint.
    pub task_id: String,
    /// Task name.
    pub task: String,
    #[schema(value_type = i64)]
    pub order_id: OrderId,
    pub status: String,
}

impl OrderSubmission {
    /// Builds the response for a task that was just queued.
    #[must_use]
    pub fn queued(task_id: &JobId, task: &str, order_id: OrderId) -> Self {
        Self {
            task_id: task_id.to_string(),
            task: task.to_string(),
            order_id,
            status: QUEUED.to_string(),
        }
    }
}

/// Current state of a submitted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TaskStatusResponse {
    pub task_id: String,
    pub task: String,
    /// One of `pending`, `running`, `completed`, `failed`, `dead_letter`.
    pub status: String,
    /// Number of attempts made so far.
    pub attempts: u32,
    /// Completion result, once the task has completed.
    pub result: Option<String>,
    /// Error from the last failed attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<JobInfo> for TaskStatusResponse {
    fn from(info: JobInfo) -> Self {
        Self {
            task_id: info.id.to_string(),
            task: info.name,
            status: info.status.to_string(),
            attempts: info.attempt,
            result: info.result,
            error: info.last_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_order_request_from_json() {
        let request: SubmitOrderRequest = serde_json::from_str(r#"{"order_id": 42}"#).unwrap();
        assert_eq!(request.order_id, OrderId(42));
    }

    #[test]
    fn test_order_submission_json_shape() {
        let id = JobId::from("4f1c");
        let submission = OrderSubmission::queued(&id, "process_order", OrderId(42));
        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "task_id": "4f1c",
                "task": "process_order",
                "order_id": 42,
                "status": "queued"
            })
        );
    }
}
