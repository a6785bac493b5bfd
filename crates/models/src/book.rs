use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::Id;

/// A book's position in the durable job pipeline (spec.md §4.D). Transitions
/// are a strict monotonic FSM driven only by the pipeline, never by a
/// client request directly.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    Queued,
    Processing,
    Ready,
    Failed,
}

impl BookStatus {
    /// Whether `self -> next` is a legal transition. Pipeline stages call
    /// this before persisting a status change; violating it is a bug, not a
    /// recoverable runtime condition, so callers are expected to assert on
    /// it rather than thread the result through `Result`.
    pub fn can_transition_to(self, next: BookStatus) -> bool {
        use BookStatus::*;
        matches!(
            (self, next),
            (Queued, Processing)
                | (Processing, Ready)
                | (Processing, Failed)
                | (Queued, Failed)
                // Retries land back in Processing from Processing itself, and
                // a failed ingest may be re-queued by an operator.
                | (Processing, Processing)
                | (Failed, Queued)
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Book {
    pub id: Id,
    pub owner_id: Id,
    pub title: String,
    pub original_filename: String,
    pub storage_key: String,
    pub status: BookStatus,
    pub error_message: Option<String>,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    pub fn is_ready(&self) -> bool {
        matches!(self.status, BookStatus::Ready)
    }
}
