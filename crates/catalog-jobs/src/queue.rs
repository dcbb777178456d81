//! Job queue abstraction.

use crate::error::JobResult;
use crate::job::{Job, JobData, JobId, JobInfo};
use crate::JobError;
use async_trait::async_trait;

/// Builder for enqueuing jobs with options.
pub struct QueuedJob<J: Job> {
    job: J,
    correlation_id: Option<String>,
    max_retries: Option<u32>,
}

impl<J: Job> QueuedJob<J> {
    /// Create a new queued job builder.
    pub const fn new(job: J) -> Self {
        Self {
            job,
            correlation_id: None,
            max_retries: None,
        }
    }

    /// Set correlation ID for tracing.
    #[must_use]
    pub fn correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Override the job type's retry budget.
    #[must_use]
    pub const fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Build the job data.
    ///
    /// # Errors
    ///
    /// Returns `JobError::Serialization` if the payload cannot be encoded.
    pub fn build(self) -> JobResult<JobData> {
        let mut data = JobData::new(&self.job)?;
        data.correlation_id = self.correlation_id;
        if let Some(retries) = self.max_retries {
            data.max_attempts = retries + 1;
        }
        Ok(data)
    }
}

/// Job queue trait for different backends.
///
/// Object-safe so services can hold an `Arc<dyn JobQueue>`; typed
/// enqueueing lives in [`JobQueueExt`].
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Store a job record and append it to its queue.
    async fn push(&self, job: JobData) -> JobResult<JobId>;

    /// Claim the next job from the first non-empty queue in `queues`.
    async fn dequeue(&self, queues: &[String], worker_id: &str) -> JobResult<Option<JobData>>;

    /// Mark a job completed and store its result.
    async fn complete(&self, job_id: &JobId, result: Option<String>) -> JobResult<()>;

    /// Record a failed attempt; re-queues or dead-letters the job.
    async fn fail(&self, job_id: &JobId, error: &JobError) -> JobResult<()>;

    /// Get job info by ID.
    async fn get_job(&self, job_id: &JobId) -> JobResult<Option<JobInfo>>;

    /// Get the stored result of a completed job.
    async fn get_result(&self, job_id: &JobId) -> JobResult<Option<String>>;

    /// Number of jobs waiting in `queue`.
    async fn queue_length(&self, queue: &str) -> JobResult<u64>;

    /// Number of jobs in the dead letter set.
    async fn dead_letter_length(&self) -> JobResult<u64>;

    /// Health check.
    async fn health_check(&self) -> JobResult<()>;
}

/// Extension trait with typed enqueue methods.
#[async_trait]
pub trait JobQueueExt: JobQueue {
    /// Enqueue a job.
    async fn enqueue<J: Job>(&self, job: J) -> JobResult<JobId> {
        self.enqueue_with(QueuedJob::new(job)).await
    }

    /// Enqueue a job with options.
    async fn enqueue_with<J: Job>(&self, queued: QueuedJob<J>) -> JobResult<JobId> {
        let data = queued.build()?;
        self.push(data).await
    }
}

impl<T: JobQueue + ?Sized> JobQueueExt for T {}
