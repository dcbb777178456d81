//! Counters for job queue activity.
//!
//! Emitted through the `metrics` facade; nothing is recorded unless the
//! host process installs a recorder.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Metric names for the job queue.
pub mod names {
    /// Total jobs enqueued.
    pub const JOBS_ENQUEUED_TOTAL: &str = "catalog_jobs_enqueued_total";
    /// Total jobs claimed by a worker.
    pub const JOBS_DEQUEUED_TOTAL: &str = "catalog_jobs_dequeued_total";
    /// Total jobs completed successfully.
    pub const JOBS_COMPLETED_TOTAL: &str = "catalog_jobs_completed_total";
    /// Total failed attempts.
    pub const JOBS_FAILED_TOTAL: &str = "catalog_jobs_failed_total";
    /// Total jobs put back in their queue after a failure.
    pub const JOBS_RETRIED_TOTAL: &str = "catalog_jobs_retried_total";
    /// Total jobs sent to the dead letter set.
    pub const JOBS_DEAD_LETTERED_TOTAL: &str = "catalog_jobs_dead_lettered_total";
    /// Job execution duration in seconds.
    pub const JOB_DURATION_SECONDS: &str = "catalog_job_duration_seconds";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(names::JOBS_ENQUEUED_TOTAL, "Total number of jobs enqueued");
    describe_counter!(
        names::JOBS_DEQUEUED_TOTAL,
        "Total number of jobs dequeued for processing"
    );
    describe_counter!(
        names::JOBS_COMPLETED_TOTAL,
        "Total number of jobs completed successfully"
    );
    describe_counter!(names::JOBS_FAILED_TOTAL, "Total number of failed job attempts");
    describe_counter!(names::JOBS_RETRIED_TOTAL, "Total number of job retries");
    describe_counter!(
        names::JOBS_DEAD_LETTERED_TOTAL,
        "Total number of jobs sent to dead letter queue"
    );
    describe_histogram!(
        names::JOB_DURATION_SECONDS,
        "Job execution duration in seconds"
    );
}

/// Job metrics recorder.
pub struct JobMetrics;

impl JobMetrics {
    /// Record a job enqueued.
    pub fn enqueued(queue: &str) {
        counter!(names::JOBS_ENQUEUED_TOTAL, "queue" => queue.to_string()).increment(1);
    }

    /// Record a job claimed by a worker.
    pub fn dequeued(queue: &str) {
        counter!(names::JOBS_DEQUEUED_TOTAL, "queue" => queue.to_string()).increment(1);
    }

    /// Record a job completed.
    pub fn completed(queue: &str) {
        counter!(names::JOBS_COMPLETED_TOTAL, "queue" => queue.to_string()).increment(1);
    }

    /// Record a failed attempt.
    pub fn failed(queue: &str) {
        counter!(names::JOBS_FAILED_TOTAL, "queue" => queue.to_string()).increment(1);
    }

    /// Record a job re-queued after failure.
    pub fn retried(queue: &str) {
        counter!(names::JOBS_RETRIED_TOTAL, "queue" => queue.to_string()).increment(1);
    }

    /// Record a job dead-lettered.
    pub fn dead_lettered(queue: &str) {
        counter!(names::JOBS_DEAD_LETTERED_TOTAL, "queue" => queue.to_string()).increment(1);
    }

    /// Record how long a job ran.
    pub fn duration(job_name: &str, duration: Duration) {
        histogram!(names::JOB_DURATION_SECONDS, "job" => job_name.to_string())
            .record(duration.as_secs_f64());
    }
}
