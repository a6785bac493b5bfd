use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Duration;
use models::{Job, JobEnvelope, JobStatus};

use crate::error::PipelineError;
use crate::stream::{Stream, StreamEntry};
use crate::status::StatusStore;

/// Tunables named in spec.md §4.D/§9, collected the way
/// `control::config::ApplicationSettings` collects its own knobs.
#[derive(Clone, Copy, Debug)]
pub struct PipelineConfig {
    pub status_ttl: Duration,
    pub claim_idle: StdDuration,
    pub read_count: usize,
    pub read_block: StdDuration,
    pub max_retries: u32,
    pub retry_delay: StdDuration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            status_ttl: Duration::hours(24),
            claim_idle: StdDuration::from_secs(30),
            read_count: 10,
            read_block: StdDuration::from_secs(2),
            max_retries: 5,
            retry_delay: StdDuration::from_secs(1),
        }
    }
}

/// The work a consumer performs for one job. Implementations are the
/// ingest worker (parse + persist chunks, enqueue the indexer job) and
/// the indexer worker (batch-embed, write vectors, mark the book ready)
/// of spec.md §2's pipeline flow; this crate only drives the envelope
/// bookkeeping around whatever they do.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, envelope: &JobEnvelope) -> anyhow::Result<()>;
}

/// Composes a `Stream` and a `StatusStore` into the enqueue/consume
/// contract of spec.md §4.D.
pub struct JobQueue<S: Stream, T: StatusStore> {
    stream: S,
    status: T,
    config: PipelineConfig,
}

impl<S: Stream, T: StatusStore> JobQueue<S, T> {
    pub fn new(stream: S, status: T, config: PipelineConfig) -> Self {
        Self { stream, status, config }
    }

    pub async fn enqueue(&self, book_id: models::Id) -> Result<models::Id, PipelineError> {
        let job = Job::new(book_id);
        let job_id = job.id;
        self.status.set(job, self.config.status_ttl).await?;
        self.stream
            .append(JobEnvelope { job_id, book_id })
            .await?;
        Ok(job_id)
    }

    pub async fn get_job(&self, job_id: models::Id) -> Result<Option<Job>, PipelineError> {
        self.status.get(job_id).await
    }

    /// Runs exactly one iteration of the consume loop for `consumer`:
    /// reclaim stale pending entries, read fresh ones, and drive each
    /// through `markProcessing` → handler → success/retry/fail, per
    /// spec.md §4.D step by step. Callers loop this from whatever
    /// scheduler they like — a dedicated thread, a tokio task, or a test
    /// harness stepping one iteration at a time.
    pub async fn run_once(&self, consumer: &str, handler: &(dyn JobHandler + Sync)) -> Result<usize, PipelineError> {
        let mut entries = self.stream.claim_idle(consumer, self.config.claim_idle, self.config.read_count).await?;
        let fresh = self.stream.read_new(consumer, self.config.read_count, self.config.read_block).await?;
        entries.extend(fresh);

        let count = entries.len();
        for entry in entries {
            self.process_one(consumer, entry, handler).await?;
        }
        Ok(count)
    }

    async fn process_one(&self, consumer: &str, entry: StreamEntry, handler: &(dyn JobHandler + Sync)) -> Result<(), PipelineError> {
        let envelope = entry.envelope;

        let Some(mut job) = self.status.get(envelope.job_id).await? else {
            tracing::warn!(job_id = %envelope.job_id, "malformed or unknown job envelope, dropping");
            self.stream.ack_delete(&[entry.id]).await?;
            return Ok(());
        };

        job.status = JobStatus::Processing;
        job.attempts += 1;
        job.updated_at = chrono::Utc::now();
        self.status.set(job.clone(), self.config.status_ttl).await?;

        match handler.handle(&envelope).await {
            Ok(()) => {
                job.status = JobStatus::Done;
                job.updated_at = chrono::Utc::now();
                self.status.set(job, self.config.status_ttl).await?;
                self.stream.ack_delete(&[entry.id]).await?;
            }
            Err(e) => {
                if job.attempts >= self.config.max_retries {
                    tracing::error!(job_id = %envelope.job_id, attempts = job.attempts, error = %e, "job failed permanently");
                    job.status = JobStatus::Failed;
                    job.error_message = Some(e.to_string());
                    job.updated_at = chrono::Utc::now();
                    self.status.set(job, self.config.status_ttl).await?;
                    self.stream.ack_delete(&[entry.id]).await?;
                } else {
                    tracing::warn!(job_id = %envelope.job_id, attempts = job.attempts, error = %e, "job failed, retrying");
                    job.status = JobStatus::Queued;
                    job.updated_at = chrono::Utc::now();
                    self.status.set(job, self.config.status_ttl).await?;

                    tokio::time::sleep(self.config.retry_delay).await;
                    self.stream.append(envelope).await?;
                    self.stream.ack_delete(&[entry.id]).await?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::InMemoryStatusStore;
    use crate::stream::MemoryStream;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct AlwaysOk;

    #[async_trait]
    impl JobHandler for AlwaysOk {
        async fn handle(&self, _envelope: &JobEnvelope) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct FailsNTimes {
        remaining: AtomicUsize,
    }

    #[async_trait]
    impl JobHandler for FailsNTimes {
        async fn handle(&self, _envelope: &JobEnvelope) -> anyhow::Result<()> {
            if self.remaining.fetch_sub(1, Ordering::SeqCst) > 0 {
                anyhow::bail!("transient failure")
            }
            Ok(())
        }
    }

    fn fast_config() -> PipelineConfig {
        PipelineConfig {
            read_block: StdDuration::ZERO,
            retry_delay: StdDuration::ZERO,
            max_retries: 3,
            ..PipelineConfig::default()
        }
    }

    #[tokio::test]
    async fn enqueue_then_run_once_marks_job_done() {
        let queue = JobQueue::new(MemoryStream::new(100), InMemoryStatusStore::new(), fast_config());
        let book_id = models::Id::new();
        let job_id = queue.enqueue(book_id).await.unwrap();

        let processed = queue.run_once("worker-a", &AlwaysOk).await.unwrap();
        assert_eq!(processed, 1);

        let job = queue.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.attempts, 1);
    }

    #[tokio::test]
    async fn failure_below_max_retries_requeues() {
        let queue = JobQueue::new(MemoryStream::new(100), InMemoryStatusStore::new(), fast_config());
        let book_id = models::Id::new();
        let job_id = queue.enqueue(book_id).await.unwrap();

        let handler = FailsNTimes { remaining: AtomicUsize::new(1) };
        queue.run_once("worker-a", &handler).await.unwrap();

        let job = queue.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.attempts, 1);

        let processed = queue.run_once("worker-a", &handler).await.unwrap();
        assert_eq!(processed, 1);
        let job = queue.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.attempts, 2);
    }

    #[tokio::test]
    async fn failure_at_max_retries_marks_failed() {
        let queue = JobQueue::new(MemoryStream::new(100), InMemoryStatusStore::new(), fast_config());
        let book_id = models::Id::new();
        let job_id = queue.enqueue(book_id).await.unwrap();

        let handler = FailsNTimes { remaining: AtomicUsize::new(10) };
        for _ in 0..3 {
            queue.run_once("worker-a", &handler).await.unwrap();
        }

        let job = queue.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.error_message.is_some());
    }

    #[tokio::test]
    async fn run_once_reclaims_stale_pending_entries() {
        let queue = Arc::new(JobQueue::new(
            MemoryStream::new(100),
            InMemoryStatusStore::new(),
            PipelineConfig { claim_idle: StdDuration::ZERO, read_block: StdDuration::ZERO, ..fast_config() },
        ));
        let book_id = models::Id::new();
        queue.enqueue(book_id).await.unwrap();

        // Simulate a crashed consumer: deliver once but never ack.
        queue.stream.read_new("crashed-worker", 10, StdDuration::ZERO).await.unwrap();

        let processed = queue.run_once("worker-b", &AlwaysOk).await.unwrap();
        assert_eq!(processed, 1);
    }
}
