//! Worker pool for processing jobs.

use crate::error::{JobError, JobResult};
use crate::job::{Job, JobContext, JobData};
use crate::metrics::JobMetrics;
use crate::queue::JobQueue;
use catalog_config::WorkerConfig;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Semaphore};
use tokio::time::timeout;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

/// Worker pool configuration.
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// Number of jobs processed concurrently.
    pub concurrency: usize,
    /// Queues to process (in priority order).
    pub queues: Vec<String>,
    /// Upper bound on a single job; the job's own timeout applies if shorter.
    pub job_timeout: Duration,
    /// Polling interval when every queue is empty.
    pub poll_interval: Duration,
    /// How long `start` waits for in-flight jobs after a stop request.
    pub shutdown_timeout: Duration,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self::from(&WorkerConfig::default())
    }
}

impl From<&WorkerConfig> for WorkerPoolConfig {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            concurrency: config.concurrency.max(1),
            queues: config.queues.clone(),
            job_timeout: config.job_timeout(),
            poll_interval: config.poll_interval(),
            shutdown_timeout: config.shutdown_timeout(),
        }
    }
}

/// Job handler function type.
pub type JobHandler =
    Arc<dyn Fn(JobData, JobContext) -> BoxFuture<'static, Result<String, JobError>> + Send + Sync>;

/// Outcome of running one claimed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The job finished and its result was stored.
    Completed(String),
    /// The attempt failed; the queue decided whether to retry.
    Failed(String),
}

#[derive(Clone)]
struct Shared {
    queue: Arc<dyn JobQueue>,
    handlers: Arc<RwLock<HashMap<String, JobHandler>>>,
    job_timeout: Duration,
    jobs_processed: Arc<AtomicU64>,
    jobs_failed: Arc<AtomicU64>,
}

impl Shared {
    async fn run(&self, job_data: JobData, worker_id: &str) -> JobOutcome {
        let job_id = job_data.id.clone();
        let job_name = job_data.name.clone();
        let ctx = job_data.to_context(worker_id);
        let limit = self
            .job_timeout
            .min(Duration::from_secs(job_data.timeout_secs.max(1)));

        debug!(job_id = %job_id, job_name = %job_name, worker_id = %worker_id, "Processing job");

        let handler = self.handlers.read().get(&job_name).cloned();
        let started = Instant::now();

        let result = match handler {
            Some(handler) => match timeout(limit, handler(job_data, ctx)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(job_id = %job_id, timeout_secs = limit.as_secs(), "Job timed out");
                    Err(JobError::Timeout(limit.as_secs()))
                }
            },
            None => {
                error!(job_name = %job_name, "No handler registered for job type");
                Err(JobError::UnknownJob(job_name.clone()))
            }
        };

        JobMetrics::duration(&job_name, started.elapsed());

        match result {
            Ok(output) => {
                if let Err(e) = self.queue.complete(&job_id, Some(output.clone())).await {
                    error!(job_id = %job_id, error = %e, "Failed to mark job as complete");
                }
                self.jobs_processed.fetch_add(1, Ordering::Relaxed);
                info!(job_id = %job_id, job_name = %job_name, result = %output, "Job completed");
                JobOutcome::Completed(output)
            }
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Job execution failed");
                if let Err(mark_err) = self.queue.fail(&job_id, &e).await {
                    error!(job_id = %job_id, error = %mark_err, "Failed to mark job as failed");
                }
                self.jobs_failed.fetch_add(1, Ordering::Relaxed);
                JobOutcome::Failed(e.to_string())
            }
        }
    }
}

/// Worker pool for concurrent job processing.
pub struct WorkerPool {
    id: String,
    shared: Shared,
    config: WorkerPoolConfig,
    shutdown_tx: watch::Sender<bool>,
    running: AtomicBool,
}

impl WorkerPool {
    /// Create a new worker pool.
    #[must_use]
    pub fn new(queue: Arc<dyn JobQueue>, config: WorkerPoolConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            id: format!("worker-pool-{}", Uuid::new_v4()),
            shared: Shared {
                queue,
                handlers: Arc::new(RwLock::new(HashMap::new())),
                job_timeout: config.job_timeout,
                jobs_processed: Arc::new(AtomicU64::new(0)),
                jobs_failed: Arc::new(AtomicU64::new(0)),
            },
            config,
            shutdown_tx,
            running: AtomicBool::new(false),
        }
    }

    /// Register a job type; claimed jobs named `J::NAME` run `J::execute`.
    pub fn register_job<J: Job>(&self) {
        let handler: JobHandler = Arc::new(
            |job_data: JobData, ctx: JobContext| -> BoxFuture<'static, Result<String, JobError>> {
                Box::pin(async move {
                    let job: J = job_data.deserialize()?;
                    job.execute(ctx).await
                })
            },
        );

        self.shared.handlers.write().insert(J::NAME.to_string(), handler);
        info!(job_type = J::NAME, "Registered job type");
    }

    /// Claim and run at most one job, inline.
    ///
    /// # Errors
    ///
    /// Returns the queue's error if claiming fails.
    pub async fn process_next(&self) -> JobResult<Option<JobOutcome>> {
        let worker_id = format!("{}-inline", self.id);
        match self.shared.queue.dequeue(&self.config.queues, &worker_id).await? {
            Some(job_data) => Ok(Some(self.shared.run(job_data, &worker_id).await)),
            None => Ok(None),
        }
    }

    /// Run the pool until [`WorkerPool::stop`] is called.
    ///
    /// A stop request is sticky: if `stop` ran first, `start` drains and
    /// returns immediately, and a stopped pool cannot be restarted.
    ///
    /// # Errors
    ///
    /// Returns `JobError::Worker` if the pool is already running.
    pub async fn start(&self) -> JobResult<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(JobError::Worker("Worker pool already running".to_string()));
        }

        info!(
            pool_id = %self.id,
            concurrency = self.config.concurrency,
            queues = ?self.config.queues,
            "Starting worker pool"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            let permit = tokio::select! {
                biased;
                _ = shutdown_rx.wait_for(|stopped| *stopped) => {
                    info!(pool_id = %self.id, "Received shutdown signal");
                    break;
                }
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let worker_id = format!("{}-{}", self.id, Uuid::new_v4());
            match self.shared.queue.dequeue(&self.config.queues, &worker_id).await {
                Ok(Some(job_data)) => {
                    let shared = self.shared.clone();
                    let span = tracing::info_span!("worker", job_id = %job_data.id, job_name = %job_data.name);
                    tokio::spawn(
                        async move {
                            shared.run(job_data, &worker_id).await;
                            drop(permit);
                        }
                        .instrument(span),
                    );
                    continue;
                }
                Ok(None) => drop(permit),
                Err(e) => {
                    drop(permit);
                    error!(error = %e, "Failed to dequeue job");
                }
            }

            tokio::select! {
                _ = shutdown_rx.wait_for(|stopped| *stopped) => {
                    info!(pool_id = %self.id, "Received shutdown signal");
                    break;
                }
                () = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        info!(pool_id = %self.id, "Waiting for workers to finish...");
        let permits = u32::try_from(self.config.concurrency).unwrap_or(u32::MAX);
        if timeout(self.config.shutdown_timeout, semaphore.acquire_many(permits))
            .await
            .is_err()
        {
            warn!(pool_id = %self.id, "Shutdown timeout elapsed with jobs still running");
        }

        self.running.store(false, Ordering::SeqCst);

        info!(
            pool_id = %self.id,
            processed = self.jobs_processed(),
            failed = self.jobs_failed(),
            "Worker pool stopped"
        );

        Ok(())
    }

    /// Stop the worker pool.
    pub fn stop(&self) {
        info!(pool_id = %self.id, "Stopping worker pool...");
        self.shutdown_tx.send_replace(true);
    }

    /// Check if the pool is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the number of jobs processed.
    #[must_use]
    pub fn jobs_processed(&self) -> u64 {
        self.shared.jobs_processed.load(Ordering::Relaxed)
    }

    /// Get the number of failed attempts.
    #[must_use]
    pub fn jobs_failed(&self) -> u64 {
        self.shared.jobs_failed.load(Ordering::Relaxed)
    }

    /// Get the pool ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryJobQueue, JobId, JobQueueExt, JobStatus};
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct GreetJob {
        name: String,
    }

    #[async_trait]
    impl Job for GreetJob {
        const NAME: &'static str = "greet";
        const QUEUE: &'static str = "greetings";

        async fn execute(&self, _ctx: JobContext) -> Result<String, JobError> {
            Ok(format!("Hello {}!", self.name))
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct SlowJob;

    #[async_trait]
    impl Job for SlowJob {
        const NAME: &'static str = "slow";
        const QUEUE: &'static str = "greetings";
        const MAX_RETRIES: u32 = 0;
        const TIMEOUT_SECS: u64 = 1;

        async fn execute(&self, _ctx: JobContext) -> Result<String, JobError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok("late".to_string())
        }
    }

    fn pool(queue: Arc<InMemoryJobQueue>) -> WorkerPool {
        let config = WorkerPoolConfig {
            concurrency: 2,
            queues: vec!["greetings".to_string()],
            job_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(10),
            shutdown_timeout: Duration::from_secs(1),
        };
        WorkerPool::new(queue, config)
    }

    #[test]
    fn test_config_from_worker_settings() {
        let config = WorkerPoolConfig::default();
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.queues, vec!["orders".to_string()]);
    }

    #[tokio::test]
    async fn test_process_next_runs_registered_job() {
        let queue = Arc::new(InMemoryJobQueue::new());
        let pool = pool(Arc::clone(&queue));
        pool.register_job::<GreetJob>();

        let id = queue
            .enqueue(GreetJob {
                name: "Ada".to_string(),
            })
            .await
            .unwrap();

        let outcome = pool.process_next().await.unwrap();
        assert_eq!(outcome, Some(JobOutcome::Completed("Hello Ada!".to_string())));
        assert_eq!(queue.get_result(&id).await.unwrap().as_deref(), Some("Hello Ada!"));
        assert_eq!(pool.jobs_processed(), 1);

        assert_eq!(pool.process_next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unregistered_job_is_dead_lettered() {
        let queue = Arc::new(InMemoryJobQueue::new());
        let pool = pool(Arc::clone(&queue));

        let id = queue
            .enqueue(GreetJob {
                name: "Ada".to_string(),
            })
            .await
            .unwrap();

        let outcome = pool.process_next().await.unwrap();
        assert!(matches!(outcome, Some(JobOutcome::Failed(_))));
        assert_eq!(job_status(&queue, &id).await, JobStatus::DeadLetter);
    }

    #[tokio::test(start_paused = true)]
    async fn test_job_timeout_fails_attempt() {
        let queue = Arc::new(InMemoryJobQueue::new());
        let pool = pool(Arc::clone(&queue));
        pool.register_job::<SlowJob>();

        let id = queue.enqueue(SlowJob).await.unwrap();

        let outcome = pool.process_next().await.unwrap();
        assert!(matches!(outcome, Some(JobOutcome::Failed(ref m)) if m.contains("timed out")));
        assert_eq!(job_status(&queue, &id).await, JobStatus::DeadLetter);
    }

    #[tokio::test]
    async fn test_start_processes_until_stopped() {
        let queue = Arc::new(InMemoryJobQueue::new());
        let pool = Arc::new(pool(Arc::clone(&queue)));
        pool.register_job::<GreetJob>();

        let id = queue
            .enqueue(GreetJob {
                name: "Grace".to_string(),
            })
            .await
            .unwrap();

        let runner = {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move { pool.start().await })
        };

        for _ in 0..200 {
            if job_status(&queue, &id).await == JobStatus::Completed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(job_status(&queue, &id).await, JobStatus::Completed);
        assert!(pool.is_running());
        assert!(pool.start().await.is_err());

        pool.stop();
        runner.await.unwrap().unwrap();
        assert!(!pool.is_running());
    }

    #[tokio::test]
    async fn test_stop_before_start_returns_promptly() {
        let queue = Arc::new(InMemoryJobQueue::new());
        let pool = Arc::new(pool(Arc::clone(&queue)));
        pool.register_job::<GreetJob>();

        pool.stop();
        let runner = {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move { pool.start().await })
        };

        let finished = tokio::time::timeout(Duration::from_secs(3), runner).await;
        assert!(matches!(finished, Ok(Ok(Ok(())))));
        assert!(!pool.is_running());
    }

    async fn job_status(queue: &InMemoryJobQueue, id: &JobId) -> JobStatus {
        queue.get_job(id).await.unwrap().unwrap().status
    }
}
