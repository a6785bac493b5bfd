use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::Id;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Done,
    Failed,
}

/// The status hash persisted for a job (spec.md §3/§6), keyed
/// `job:<stream>:<job_id>` with a TTL in a production backend. The stream
/// itself only ever carries the lightweight envelope (`JobEnvelope`); this
/// is the richer, independently-queryable record `GetJob` reads.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Job {
    pub id: Id,
    pub book_id: Id,
    pub status: JobStatus,
    pub attempts: u32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(book_id: Id) -> Self {
        let now = Utc::now();
        Self {
            id: Id::new(),
            book_id,
            status: JobStatus::Queued,
            attempts: 0,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The stream entry itself (spec.md §6): `{job_id, book_id}`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct JobEnvelope {
    pub job_id: Id,
    pub book_id: Id,
}
