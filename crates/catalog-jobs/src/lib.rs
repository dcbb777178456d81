//! # Catalog Jobs
//!
//! Task queue used to hand order processing off to a separate worker
//! process.
//!
//! ```text
//! POST /orders ──► OrderService ──► JobQueue::push ──► {prefix}:pqueue:orders
//!                                                          │
//!                         catalog-worker ◄── dequeue ◄─────┘
//!                              │
//!                              ├─ ok    ──► {prefix}:result:{id}
//!                              └─ error ──► re-queue, or {prefix}:dlq
//! ```
//!
//! Two backends implement [`JobQueue`]: [`RedisJobQueue`] for deployments
//! and [`InMemoryJobQueue`] for tests and local runs.

pub mod config;
pub mod error;
pub mod job;
pub mod memory;
pub mod metrics;
pub mod queue;
pub mod redis;
pub mod worker;

pub use config::QueueSettings;
pub use error::{JobError, JobResult};
pub use job::{Job, JobContext, JobData, JobId, JobInfo, JobStatus};
pub use memory::InMemoryJobQueue;
pub use metrics::{register_metrics, JobMetrics};
pub use queue::{JobQueue, JobQueueExt, QueuedJob};
pub use redis::{create_pool, RedisJobQueue, RedisKeys};
pub use worker::{JobHandler, JobOutcome, WorkerPool, WorkerPoolConfig};
