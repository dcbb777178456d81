//! In-process job queue.
//!
//! Same claim/complete/fail semantics as the Redis backend, without
//! persistence. Finished jobs are kept for `QueueSettings::result_ttl`,
//! measured on the tokio clock, then evicted on the next access.

use crate::config::QueueSettings;
use crate::error::{JobError, JobResult};
use crate::job::{JobData, JobId, JobInfo, JobStatus};
use crate::metrics::JobMetrics;
use crate::queue::JobQueue;
use async_trait::async_trait;
use catalog_core::{HealthCheck, HealthStatus};
use parking_lot::{Mutex, MutexGuard};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Default)]
struct State {
    queues: HashMap<String, VecDeque<JobId>>,
    jobs: HashMap<JobId, JobData>,
    active: HashMap<JobId, String>,
    results: HashMap<JobId, String>,
    dead_letter: HashSet<JobId>,
    /// Completed and dead-lettered jobs in the order they finished.
    finished: VecDeque<(Instant, JobId)>,
}

impl State {
    fn mark_finished(&mut self, job_id: JobId) {
        self.finished.push_back((Instant::now(), job_id));
    }

    fn evict_expired(&mut self, retention: Duration) {
        let now = Instant::now();
        while self
            .finished
            .front()
            .is_some_and(|(at, _)| now.duration_since(*at) >= retention)
        {
            if let Some((_, job_id)) = self.finished.pop_front() {
                self.jobs.remove(&job_id);
                self.results.remove(&job_id);
                self.dead_letter.remove(&job_id);
            }
        }
    }
}

/// In-memory job queue.
pub struct InMemoryJobQueue {
    state: Mutex<State>,
    offline: AtomicBool,
    result_ttl: Duration,
}

impl Default for InMemoryJobQueue {
    fn default() -> Self {
        Self::with_settings(QueueSettings::default())
    }
}

impl InMemoryJobQueue {
    /// Creates an empty queue with the default retention.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty queue that keeps finished jobs for `settings.result_ttl`.
    #[must_use]
    pub fn with_settings(settings: QueueSettings) -> Self {
        Self {
            state: Mutex::new(State::default()),
            offline: AtomicBool::new(false),
            result_ttl: settings.result_ttl,
        }
    }

    /// Makes every operation fail as if the broker were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Returns the worker currently holding `job_id`, if any.
    #[must_use]
    pub fn active_worker(&self, job_id: &JobId) -> Option<String> {
        self.lock_state().active.get(job_id).cloned()
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        let mut guard = self.state.lock();
        guard.evict_expired(self.result_ttl);
        guard
    }

    fn ensure_online(&self) -> JobResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(JobError::Worker("broker is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn push(&self, job: JobData) -> JobResult<JobId> {
        self.ensure_online()?;
        let id = job.id.clone();
        let queue = job.queue.clone();

        {
            let mut state = self.lock_state();
            state
                .queues
                .entry(queue.clone())
                .or_default()
                .push_back(id.clone());
            state.jobs.insert(id.clone(), job);
        }

        JobMetrics::enqueued(&queue);
        debug!(job_id = %id, queue = %queue, "Enqueued job");
        Ok(id)
    }

    async fn dequeue(&self, queues: &[String], worker_id: &str) -> JobResult<Option<JobData>> {
        self.ensure_online()?;
        let mut state = self.lock_state();

        for queue_name in queues {
            while let Some(job_id) = state
                .queues
                .get_mut(queue_name)
                .and_then(VecDeque::pop_front)
            {
                let Some(job) = state.jobs.get_mut(&job_id) else {
                    warn!(job_id = %job_id, "Queued job has no record; skipping");
                    continue;
                };
                job.begin_attempt();
                let claimed = job.clone();
                state.active.insert(job_id, worker_id.to_string());

                JobMetrics::dequeued(&claimed.queue);
                return Ok(Some(claimed));
            }
        }

        Ok(None)
    }

    async fn complete(&self, job_id: &JobId, result: Option<String>) -> JobResult<()> {
        self.ensure_online()?;
        let mut state = self.lock_state();

        let job = state
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))?;
        job.status = JobStatus::Completed;
        let queue = job.queue.clone();

        state.active.remove(job_id);
        if let Some(result) = result {
            state.results.insert(job_id.clone(), result);
        }
        state.mark_finished(job_id.clone());

        JobMetrics::completed(&queue);
        debug!(job_id = %job_id, "Completed job");
        Ok(())
    }

    async fn fail(&self, job_id: &JobId, error: &JobError) -> JobResult<()> {
        self.ensure_online()?;
        let mut state = self.lock_state();

        let job = state
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))?;
        let retry = job.should_retry(error);
        job.record_failure(error, retry);
        let queue = job.queue.clone();

        state.active.remove(job_id);
        if retry {
            state
                .queues
                .entry(queue.clone())
                .or_default()
                .push_back(job_id.clone());
            JobMetrics::retried(&queue);
        } else {
            state.dead_letter.insert(job_id.clone());
            state.mark_finished(job_id.clone());
            JobMetrics::dead_lettered(&queue);
            warn!(job_id = %job_id, error = %error, "Moved job to dead letter queue");
        }

        JobMetrics::failed(&queue);
        Ok(())
    }

    async fn get_job(&self, job_id: &JobId) -> JobResult<Option<JobInfo>> {
        self.ensure_online()?;
        let state = self.lock_state();
        Ok(state.jobs.get(job_id).map(|job| {
            JobInfo::from_data(job.clone(), state.results.get(job_id).cloned())
        }))
    }

    async fn get_result(&self, job_id: &JobId) -> JobResult<Option<String>> {
        self.ensure_online()?;
        Ok(self.lock_state().results.get(job_id).cloned())
    }

    async fn queue_length(&self, queue: &str) -> JobResult<u64> {
        self.ensure_online()?;
        Ok(self
            .lock_state()
            .queues
            .get(queue)
            .map_or(0, |q| q.len() as u64))
    }

    async fn dead_letter_length(&self) -> JobResult<u64> {
        self.ensure_online()?;
        Ok(self.lock_state().dead_letter.len() as u64)
    }

    async fn health_check(&self) -> JobResult<()> {
        self.ensure_online()
    }
}

#[async_trait]
impl HealthCheck for InMemoryJobQueue {
    fn name(&self) -> &str {
        "broker"
    }

    async fn check(&self) -> HealthStatus {
        match self.ensure_online() {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Job, JobContext, JobQueueExt};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct EchoJob {
        text: String,
    }

    #[async_trait]
    impl Job for EchoJob {
        const NAME: &'static str = "echo";
        const QUEUE: &'static str = "echoes";
        const MAX_RETRIES: u32 = 1;

        async fn execute(&self, _ctx: JobContext) -> Result<String, JobError> {
            Ok(self.text.clone())
        }
    }

    fn queues() -> Vec<String> {
        vec!["echoes".to_string()]
    }

    async fn enqueue(queue: &InMemoryJobQueue) -> JobId {
        queue
            .enqueue(EchoJob {
                text: "hi".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_enqueue_then_dequeue_fifo() {
        let queue = InMemoryJobQueue::new();
        let first = enqueue(&queue).await;
        let second = enqueue(&queue).await;
        assert_eq!(queue.queue_length("echoes").await.unwrap(), 2);

        let claimed = queue.dequeue(&queues(), "w1").await.unwrap().unwrap();
        assert_eq!(claimed.id, first);
        assert_eq!(claimed.attempt, 1);
        assert_eq!(claimed.status, JobStatus::Running);
        assert_eq!(queue.active_worker(&first).as_deref(), Some("w1"));

        let claimed = queue.dequeue(&queues(), "w1").await.unwrap().unwrap();
        assert_eq!(claimed.id, second);
        assert!(queue.dequeue(&queues(), "w1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_complete_stores_result() {
        let queue = InMemoryJobQueue::new();
        let id = enqueue(&queue).await;
        queue.dequeue(&queues(), "w1").await.unwrap();

        queue.complete(&id, Some("done".to_string())).await.unwrap();

        let info = queue.get_job(&id).await.unwrap().unwrap();
        assert_eq!(info.status, JobStatus::Completed);
        assert_eq!(info.result.as_deref(), Some("done"));
        assert_eq!(queue.get_result(&id).await.unwrap().as_deref(), Some("done"));
        assert!(queue.active_worker(&id).is_none());
    }

    #[tokio::test]
    async fn test_retryable_failure_requeues_until_exhausted() {
        let queue = InMemoryJobQueue::new();
        let id = enqueue(&queue).await;
        let error = JobError::ExecutionFailed("boom".into());

        queue.dequeue(&queues(), "w1").await.unwrap();
        queue.fail(&id, &error).await.unwrap();
        assert_eq!(queue.get_job(&id).await.unwrap().unwrap().status, JobStatus::Failed);
        assert_eq!(queue.queue_length("echoes").await.unwrap(), 1);

        queue.dequeue(&queues(), "w1").await.unwrap();
        queue.fail(&id, &error).await.unwrap();

        let info = queue.get_job(&id).await.unwrap().unwrap();
        assert_eq!(info.status, JobStatus::DeadLetter);
        assert_eq!(info.attempt, 2);
        assert_eq!(queue.queue_length("echoes").await.unwrap(), 0);
        assert_eq!(queue.dead_letter_length().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_non_retryable_failure_dead_letters_immediately() {
        let queue = InMemoryJobQueue::new();
        let id = enqueue(&queue).await;
        queue.dequeue(&queues(), "w1").await.unwrap();

        queue
            .fail(&id, &JobError::UnknownJob("echo".into()))
            .await
            .unwrap();

        assert_eq!(queue.dead_letter_length().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_job_lookups() {
        let queue = InMemoryJobQueue::new();
        let id = JobId::new();
        assert!(queue.get_job(&id).await.unwrap().is_none());
        assert!(matches!(
            queue.complete(&id, None).await,
            Err(JobError::NotFound(_))
        ));
    }

    async fn run_to_completion(queue: &InMemoryJobQueue) -> JobId {
        let id = enqueue(queue).await;
        queue.dequeue(&queues(), "w1").await.unwrap();
        queue.complete(&id, Some("done".to_string())).await.unwrap();
        id
    }

    fn short_retention() -> InMemoryJobQueue {
        InMemoryJobQueue::with_settings(QueueSettings {
            result_ttl: Duration::from_secs(60),
            ..QueueSettings::default()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_jobs_are_evicted_after_result_ttl() {
        let queue = short_retention();
        let mut ids = Vec::new();
        for _ in 0..1000 {
            ids.push(run_to_completion(&queue).await);
        }

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(queue.get_result(&ids[0]).await.unwrap().as_deref(), Some("done"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(queue.get_job(&ids[0]).await.unwrap().is_none());
        assert!(queue.get_result(&ids[999]).await.unwrap().is_none());

        let state = queue.state.lock();
        assert!(state.jobs.is_empty());
        assert!(state.results.is_empty());
        assert!(state.finished.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dead_letters_are_evicted_but_pending_jobs_are_kept() {
        let queue = short_retention();
        let failed = enqueue(&queue).await;
        queue.dequeue(&queues(), "w1").await.unwrap();
        queue
            .fail(&failed, &JobError::UnknownJob("echo".into()))
            .await
            .unwrap();
        let pending = enqueue(&queue).await;
        assert_eq!(queue.dead_letter_length().await.unwrap(), 1);

        tokio::time::advance(Duration::from_secs(120)).await;

        assert_eq!(queue.dead_letter_length().await.unwrap(), 0);
        assert!(queue.get_job(&failed).await.unwrap().is_none());
        assert_eq!(
            queue.get_job(&pending).await.unwrap().unwrap().status,
            JobStatus::Pending
        );
        assert_eq!(queue.queue_length("echoes").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_offline_queue_rejects_operations() {
        let queue = InMemoryJobQueue::new();
        queue.set_offline(true);

        assert!(queue.health_check().await.is_err());
        assert!(queue.check().await.is_unhealthy());
        assert!(queue
            .enqueue(EchoJob {
                text: "hi".to_string()
            })
            .await
            .is_err());

        queue.set_offline(false);
        assert!(queue.health_check().await.is_ok());
    }
}
