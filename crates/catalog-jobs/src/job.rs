//! Job trait and definitions.

use crate::error::{JobError, JobResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Unique job identifier (UUID v4 string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Creates a new random job ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Creates a job ID from a string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the job ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Job execution context.
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Job ID.
    pub job_id: JobId,
    /// Current attempt number (1-based).
    pub attempt: u32,
    /// Maximum attempts allowed.
    pub max_attempts: u32,
    /// Queue name.
    pub queue: String,
    /// Job started executing at this time.
    pub started_at: DateTime<Utc>,
    /// Correlation ID for tracing.
    pub correlation_id: Option<String>,
    /// Worker ID processing this job.
    pub worker_id: String,
}

impl JobContext {
    /// Returns true if this is the last attempt.
    #[must_use]
    pub const fn is_last_attempt(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}

/// A unit of background work.
///
/// The value returned by `execute` is stored as the task's result and is
/// what a status lookup reports once the job has completed.
#[async_trait]
pub trait Job: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Unique name for this job type.
    const NAME: &'static str;

    /// Queue name for this job type.
    const QUEUE: &'static str = "default";

    /// Maximum number of retry attempts.
    const MAX_RETRIES: u32 = 3;

    /// Job timeout in seconds.
    const TIMEOUT_SECS: u64 = 300;

    /// Execute the job, returning its completion result.
    async fn execute(&self, ctx: JobContext) -> Result<String, JobError>;

    /// Returns the job timeout.
    fn timeout(&self) -> Duration {
        Duration::from_secs(Self::TIMEOUT_SECS)
    }
}

/// Job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting in its queue.
    #[default]
    Pending,
    /// Claimed by a worker.
    Running,
    /// Finished; the result is available.
    Completed,
    /// The last attempt failed; queued again for another attempt.
    Failed,
    /// Attempts exhausted or the failure is not retryable.
    DeadLetter,
}

impl JobStatus {
    /// Returns true once no further attempts will be made.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::DeadLetter)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::DeadLetter => "dead_letter",
        };
        f.write_str(s)
    }
}

/// Serialized job record stored by the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobData {
    /// Job ID.
    pub id: JobId,
    /// Job type name.
    pub name: String,
    /// Queue name.
    pub queue: String,
    /// Serialized job payload (JSON).
    pub payload: String,
    /// Attempts made so far.
    pub attempt: u32,
    /// Maximum attempts.
    pub max_attempts: u32,
    /// Job timeout in seconds.
    pub timeout_secs: u64,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When the job became eligible to run.
    pub scheduled_at: DateTime<Utc>,
    /// Correlation ID for tracing.
    pub correlation_id: Option<String>,
    /// Error from last failed attempt.
    pub last_error: Option<String>,
    /// Current status.
    #[serde(default)]
    pub status: JobStatus,
}

impl JobData {
    /// Creates new job data from a Job instance.
    ///
    /// # Errors
    ///
    /// Returns `JobError::Serialization` if the payload cannot be encoded.
    pub fn new<J: Job>(job: &J) -> JobResult<Self> {
        let now = Utc::now();
        Ok(Self {
            id: JobId::new(),
            name: J::NAME.to_string(),
            queue: J::QUEUE.to_string(),
            payload: serde_json::to_string(job)?,
            attempt: 0,
            max_attempts: J::MAX_RETRIES + 1,
            timeout_secs: job.timeout().as_secs(),
            created_at: now,
            scheduled_at: now,
            correlation_id: None,
            last_error: None,
            status: JobStatus::Pending,
        })
    }

    /// Deserialize the job payload.
    ///
    /// # Errors
    ///
    /// Returns `JobError::Serialization` if the payload does not match `J`.
    pub fn deserialize<J: Job>(&self) -> JobResult<J> {
        Ok(serde_json::from_str(&self.payload)?)
    }

    /// Check if max attempts reached.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }

    /// Whether a failure with `error` should put the job back in its queue.
    #[must_use]
    pub const fn should_retry(&self, error: &JobError) -> bool {
        !self.is_exhausted() && error.is_retryable() && !error.should_dlq()
    }

    /// Marks the job as claimed for a new attempt.
    pub fn begin_attempt(&mut self) {
        self.attempt += 1;
        self.status = JobStatus::Running;
    }

    /// Records a failed attempt.
    pub fn record_failure(&mut self, error: &JobError, retry: bool) {
        self.last_error = Some(error.to_string());
        self.status = if retry {
            JobStatus::Failed
        } else {
            JobStatus::DeadLetter
        };
    }

    /// Create job context for execution.
    #[must_use]
    pub fn to_context(&self, worker_id: &str) -> JobContext {
        JobContext {
            job_id: self.id.clone(),
            attempt: self.attempt,
            max_attempts: self.max_attempts,
            queue: self.queue.clone(),
            started_at: Utc::now(),
            correlation_id: self.correlation_id.clone(),
            worker_id: worker_id.to_string(),
        }
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns `JobError::Serialization` on encoding failure.
    pub fn to_json(&self) -> JobResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns `JobError::Serialization` if `json` is not a job record.
    pub fn from_json(json: &str) -> JobResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Job information for status queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInfo {
    /// Job ID.
    pub id: JobId,
    /// Job type name.
    pub name: String,
    /// Queue name.
    pub queue: String,
    /// Current status.
    pub status: JobStatus,
    /// Attempts made so far.
    pub attempt: u32,
    /// Max attempts.
    pub max_attempts: u32,
    /// Created timestamp.
    pub created_at: DateTime<Utc>,
    /// Last error.
    pub last_error: Option<String>,
    /// Completion result, once completed.
    pub result: Option<String>,
}

impl JobInfo {
    /// Builds status information from a stored record and its result.
    #[must_use]
    pub fn from_data(data: JobData, result: Option<String>) -> Self {
        Self {
            id: data.id,
            name: data.name,
            queue: data.queue,
            status: data.status,
            attempt: data.attempt,
            max_attempts: data.max_attempts,
            created_at: data.created_at,
            last_error: data.last_error,
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct TestJob {
        message: String,
    }

    #[async_trait]
    impl Job for TestJob {
        const NAME: &'static str = "test_job";
        const QUEUE: &'static str = "test";

        async fn execute(&self, _ctx: JobContext) -> Result<String, JobError> {
            Ok(self.message.clone())
        }
    }

    fn data() -> JobData {
        JobData::new(&TestJob {
            message: "Hello".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_job_id_generation() {
        assert_ne!(JobId::new(), JobId::new());
        assert_eq!(JobId::new().as_str().len(), 36);
    }

    #[test]
    fn test_job_data_from_job() {
        let data = data();
        assert_eq!(data.name, "test_job");
        assert_eq!(data.queue, "test");
        assert_eq!(data.payload, r#"{"message":"Hello"}"#);
        assert_eq!(data.max_attempts, 4);
        assert_eq!(data.status, JobStatus::Pending);

        let job: TestJob = data.deserialize().unwrap();
        assert_eq!(job.message, "Hello");
    }

    #[test]
    fn test_retry_decision() {
        let mut data = data();
        data.begin_attempt();
        assert_eq!(data.status, JobStatus::Running);
        assert!(data.should_retry(&JobError::ExecutionFailed("boom".into())));
        assert!(!data.should_retry(&JobError::UnknownJob("x".into())));

        data.attempt = data.max_attempts;
        assert!(!data.should_retry(&JobError::ExecutionFailed("boom".into())));
    }

    #[test]
    fn test_record_failure() {
        let mut data = data();
        data.record_failure(&JobError::Timeout(5), true);
        assert_eq!(data.status, JobStatus::Failed);
        assert!(data.last_error.as_deref().unwrap().contains('5'));

        data.record_failure(&JobError::Timeout(5), false);
        assert_eq!(data.status, JobStatus::DeadLetter);
        assert!(data.status.is_terminal());
    }

    #[test]
    fn test_job_context() {
        let mut data = data();
        data.begin_attempt();
        let ctx = data.to_context("worker-1");
        assert_eq!(ctx.attempt, 1);
        assert_eq!(ctx.worker_id, "worker-1");
        assert!(!ctx.is_last_attempt());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&JobStatus::DeadLetter).unwrap(),
            r#""dead_letter""#
        );
        assert_eq!(JobStatus::Completed.to_string(), "completed");
    }
}
