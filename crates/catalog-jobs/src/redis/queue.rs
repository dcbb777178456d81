//! Redis job queue implementation.

use super::RedisKeys;
use crate::config::QueueSettings;
use crate::error::{JobError, JobResult};
use crate::job::{JobData, JobId, JobInfo, JobStatus};
use crate::metrics::JobMetrics;
use crate::queue::JobQueue;
use async_trait::async_trait;
use catalog_core::{HealthCheck, HealthStatus};
use chrono::{DateTime, Utc};
use deadpool_redis::Pool;
use redis::{AsyncCommands, Script};
use tracing::{debug, error, warn};

/// Pops the lowest-scored id from `KEYS[1]` and records it in the active
/// hash `KEYS[2]` under worker `ARGV[1]`, in one step.
const CLAIM_SCRIPT: &str = r#"
    local popped = redis.call("ZPOPMIN", KEYS[1], 1)
    if #popped == 0 then
        return false
    end
    redis.call("HSET", KEYS[2], popped[1], ARGV[1])
    return popped[1]
"#;

/// What a worker does with an id it has claimed.
#[derive(Debug)]
enum Claim {
    Run(JobData),
    DeadLetter(String),
}

fn classify_claim(record: Option<String>) -> Claim {
    match record {
        None => Claim::DeadLetter("job record is missing".to_string()),
        Some(json) => match JobData::from_json(&json) {
            Ok(data) => Claim::Run(data),
            Err(e) => Claim::DeadLetter(format!("job record is undecodable: {e}")),
        },
    }
}

/// Redis-backed job queue.
///
/// Queues hold job ids; the record itself lives under `job:{id}` so a
/// status lookup and a worker always see the same state.
pub struct RedisJobQueue {
    pool: Pool,
    keys: RedisKeys,
    settings: QueueSettings,
    claim_script: Script,
}

impl RedisJobQueue {
    /// Create a new Redis job queue.
    #[must_use]
    pub fn new(pool: Pool, settings: QueueSettings) -> Self {
        let keys = RedisKeys::new(&settings.key_prefix);
        Self {
            pool,
            keys,
            settings,
            claim_script: Script::new(CLAIM_SCRIPT),
        }
    }

    async fn conn(&self) -> JobResult<deadpool_redis::Connection> {
        Ok(self.pool.get().await?)
    }

    fn score(data: &JobData) -> f64 {
        Self::score_at(data.scheduled_at)
    }

    fn score_at(at: DateTime<Utc>) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let score = at.timestamp_millis() as f64;
        score
    }

    /// Puts a claimed id back on its queue after the claim could not be completed.
    async fn release(
        &self,
        conn: &mut deadpool_redis::Connection,
        queue_name: &str,
        job_id: &JobId,
        scheduled_at: DateTime<Utc>,
    ) {
        let restored: redis::RedisResult<()> = redis::pipe()
            .atomic()
            .hdel(self.keys.active(), job_id.as_str())
            .zadd(
                self.keys.priority_queue(queue_name),
                job_id.as_str(),
                Self::score_at(scheduled_at),
            )
            .query_async(&mut **conn)
            .await;

        match restored {
            Ok(()) => warn!(job_id = %job_id, "Claim failed; job returned to its queue"),
            Err(e) => error!(
                job_id = %job_id,
                error = %e,
                "Claim failed and the job could not be re-queued; it remains in the active set"
            ),
        }
    }

    async fn dead_letter_record(
        &self,
        conn: &mut deadpool_redis::Connection,
        job_id: &JobId,
        reason: &str,
    ) -> JobResult<()> {
        let _: () = redis::pipe()
            .atomic()
            .hdel(self.keys.active(), job_id.as_str())
            .zadd(self.keys.dlq(), job_id.as_str(), Self::score_at(Utc::now()))
            .query_async(&mut **conn)
            .await?;

        warn!(job_id = %job_id, reason = %reason, "Moved unreadable job to dead letter queue");
        Ok(())
    }

    async fn load(&self, conn: &mut deadpool_redis::Connection, job_id: &JobId) -> JobResult<Option<JobData>> {
        let json: Option<String> = conn.get(self.keys.job(job_id.as_str())).await?;
        json.map(|j| JobData::from_json(&j)).transpose()
    }

    fn result_ttl_secs(&self) -> u64 {
        self.settings.result_ttl.as_secs().max(1)
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn push(&self, job: JobData) -> JobResult<JobId> {
        let job_json = job.to_json()?;
        let mut conn = self.conn().await?;

        let _: () = redis::pipe()
            .atomic()
            .set(self.keys.job(job.id.as_str()), &job_json)
            .zadd(self.keys.priority_queue(&job.queue), job.id.as_str(), Self::score(&job))
            .query_async(&mut *conn)
            .await?;

        JobMetrics::enqueued(&job.queue);
        debug!(job_id = %job.id, queue = %job.queue, job_name = %job.name, "Enqueued job");

        Ok(job.id)
    }

    async fn dequeue(&self, queues: &[String], worker_id: &str) -> JobResult<Option<JobData>> {
        let mut conn = self.conn().await?;

        for queue_name in queues {
            let claimed: Option<String> = self
                .claim_script
                .key(self.keys.priority_queue(queue_name))
                .key(self.keys.active())
                .arg(worker_id)
                .invoke_async(&mut *conn)
                .await?;

            let Some(job_id) = claimed else {
                continue;
            };
            let job_id = JobId::from(job_id);

            let record = match conn.get::<_, Option<String>>(self.keys.job(job_id.as_str())).await {
                Ok(record) => record,
                Err(e) => {
                    self.release(&mut conn, queue_name, &job_id, Utc::now()).await;
                    return Err(e.into());
                }
            };

            let mut job_data = match classify_claim(record) {
                Claim::Run(data) => data,
                Claim::DeadLetter(reason) => {
                    self.dead_letter_record(&mut conn, &job_id, &reason).await?;
                    continue;
                }
            };

            job_data.begin_attempt();

            let stored = match job_data.to_json() {
                Ok(json) => conn
                    .set::<_, _, ()>(self.keys.job(job_id.as_str()), json)
                    .await
                    .map_err(JobError::from),
                Err(e) => Err(e),
            };
            if let Err(e) = stored {
                self.release(&mut conn, queue_name, &job_id, job_data.scheduled_at).await;
                return Err(e);
            }

            JobMetrics::dequeued(&job_data.queue);
            debug!(
                job_id = %job_data.id,
                queue = %job_data.queue,
                attempt = job_data.attempt,
                worker_id = %worker_id,
                "Dequeued job"
            );

            return Ok(Some(job_data));
        }

        Ok(None)
    }

    async fn complete(&self, job_id: &JobId, result: Option<String>) -> JobResult<()> {
        let mut conn = self.conn().await?;
        let mut job_data = self
            .load(&mut conn, job_id)
            .await?
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))?;

        job_data.status = JobStatus::Completed;
        let ttl = self.result_ttl_secs();

        let mut pipe = redis::pipe();
        pipe.atomic()
            .set_ex(self.keys.job(job_id.as_str()), job_data.to_json()?, ttl)
            .hdel(self.keys.active(), job_id.as_str());
        if let Some(result) = &result {
            pipe.set_ex(self.keys.result(job_id.as_str()), result, ttl);
        }
        let _: () = pipe.query_async(&mut *conn).await?;

        JobMetrics::completed(&job_data.queue);
        debug!(job_id = %job_id, "Completed job");

        Ok(())
    }

    async fn fail(&self, job_id: &JobId, error: &JobError) -> JobResult<()> {
        let mut conn = self.conn().await?;
        let Some(mut job_data) = self.load(&mut conn, job_id).await? else {
            return Err(JobError::NotFound(job_id.to_string()));
        };

        let retry = job_data.should_retry(error);
        job_data.record_failure(error, retry);

        let mut pipe = redis::pipe();
        pipe.atomic().hdel(self.keys.active(), job_id.as_str());

        if retry {
            job_data.scheduled_at = Utc::now();
            pipe.set(self.keys.job(job_id.as_str()), job_data.to_json()?).zadd(
                self.keys.priority_queue(&job_data.queue),
                job_id.as_str(),
                Self::score(&job_data),
            );
            JobMetrics::retried(&job_data.queue);
            debug!(job_id = %job_id, attempt = job_data.attempt, error = %error, "Re-queued failed job");
        } else {
            #[allow(clippy::cast_precision_loss)]
            let now = Utc::now().timestamp_millis() as f64;
            pipe.set_ex(
                self.keys.job(job_id.as_str()),
                job_data.to_json()?,
                self.result_ttl_secs(),
            )
            .zadd(self.keys.dlq(), job_id.as_str(), now);
            JobMetrics::dead_lettered(&job_data.queue);
            warn!(
                job_id = %job_id,
                error = %error,
                attempts = job_data.attempt,
                "Moved job to dead letter queue"
            );
        }

        let _: () = pipe.query_async(&mut *conn).await?;
        JobMetrics::failed(&job_data.queue);

        Ok(())
    }

    async fn get_job(&self, job_id: &JobId) -> JobResult<Option<JobInfo>> {
        let mut conn = self.conn().await?;
        let Some(job_data) = self.load(&mut conn, job_id).await? else {
            return Ok(None);
        };

        let result: Option<String> = if job_data.status == JobStatus::Completed {
            conn.get(self.keys.result(job_id.as_str())).await?
        } else {
            None
        };

        Ok(Some(JobInfo::from_data(job_data, result)))
    }

    async fn get_result(&self, job_id: &JobId) -> JobResult<Option<String>> {
        let mut conn = self.conn().await?;
        Ok(conn.get(self.keys.result(job_id.as_str())).await?)
    }

    async fn queue_length(&self, queue: &str) -> JobResult<u64> {
        let mut conn = self.conn().await?;
        Ok(conn.zcard(self.keys.priority_queue(queue)).await?)
    }

    async fn dead_letter_length(&self) -> JobResult<u64> {
        let mut conn = self.conn().await?;
        Ok(conn.zcard(self.keys.dlq()).await?)
    }

    async fn health_check(&self) -> JobResult<()> {
        let mut conn = self.conn().await?;
        let _: String = redis::cmd("PING").query_async(&mut *conn).await?;
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for RedisJobQueue {
    fn name(&self) -> &str {
        "broker"
    }

    async fn check(&self) -> HealthStatus {
        match JobQueue::health_check(self).await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Job, JobContext, QueuedJob};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct NoteJob {
        note: String,
    }

    #[async_trait]
    impl Job for NoteJob {
        const NAME: &'static str = "note";

        async fn execute(&self, _ctx: JobContext) -> Result<String, JobError> {
            Ok(self.note.clone())
        }
    }

    #[test]
    fn test_decodable_record_is_run() {
        let data = QueuedJob::new(NoteJob {
            note: "hi".to_string(),
        })
        .build()
        .unwrap();
        let id = data.id.clone();

        match classify_claim(Some(data.to_json().unwrap())) {
            Claim::Run(claimed) => assert_eq!(claimed.id, id),
            Claim::DeadLetter(reason) => panic!("unexpected dead letter: {reason}"),
        }
    }

    #[test]
    fn test_missing_record_is_dead_lettered() {
        assert!(matches!(classify_claim(None), Claim::DeadLetter(_)));
    }

    #[test]
    fn test_undecodable_record_is_dead_lettered() {
        let claim = classify_claim(Some("{not json".to_string()));
        assert!(matches!(claim, Claim::DeadLetter(ref reason) if reason.contains("undecodable")));
    }

    #[test]
    fn test_claim_script_pops_and_marks_active_together() {
        let pop = CLAIM_SCRIPT.find("ZPOPMIN").unwrap();
        let mark = CLAIM_SCRIPT.find("HSET").unwrap();
        assert!(pop < mark);
    }
}
