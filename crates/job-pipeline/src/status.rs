use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use models::{Id, Job};

use crate::error::PipelineError;

/// The `job:<stream>:<job_id>` status hash (spec.md §6), independently
/// readable via `GetJob` regardless of where the job sits in the stream.
#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn set(&self, job: Job, ttl: Duration) -> Result<(), PipelineError>;
    async fn get(&self, job_id: Id) -> Result<Option<Job>, PipelineError>;
}

struct Entry {
    job: Job,
    expires_at: DateTime<Utc>,
}

pub struct InMemoryStatusStore {
    entries: Mutex<HashMap<Id, Entry>>,
}

impl Default for InMemoryStatusStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Id, Entry>> {
        self.entries.lock().expect("job status mutex poisoned")
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn set(&self, job: Job, ttl: Duration) -> Result<(), PipelineError> {
        let expires_at = Utc::now() + ttl;
        self.lock().insert(job.id, Entry { job, expires_at });
        Ok(())
    }

    async fn get(&self, job_id: Id) -> Result<Option<Job>, PipelineError> {
        let mut entries = self.lock();
        if let Some(entry) = entries.get(&job_id) {
            if entry.expires_at <= Utc::now() {
                entries.remove(&job_id);
                return Ok(None);
            }
        }
        Ok(entries.get(&job_id).map(|e| e.job.clone()))
    }
}
