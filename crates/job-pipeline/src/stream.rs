use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use models::JobEnvelope;

use crate::error::PipelineError;

/// One delivered stream entry: a stable id plus the envelope it carries.
/// The id is what `ack_delete` and `claim_idle` key off of — mirrors a
/// Redis Streams entry ID, but is an opaque string here since nothing in
/// this crate parses its structure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamEntry {
    pub id: String,
    pub envelope: JobEnvelope,
}

/// An ordered, appendable stream with a single consumer group's pending
/// (claimed-but-unacked) set and idle-reclaim, modeled structurally on
/// Redis Streams' `XADD`/`XREADGROUP`/`XCLAIM`/`XACK`+`XDEL` (spec.md
/// §4.D). A production implementation would be a thin wrapper over a
/// `redis` client issuing exactly those commands; `MemoryStream` below
/// reproduces the same semantics in-process for tests and for drivers
/// that don't need external durability.
#[async_trait]
pub trait Stream: Send + Sync {
    /// Appends an envelope, returning its entry id. Implementations
    /// enforce an approximate max length (oldest entries trimmed first),
    /// matching `XADD ... MAXLEN ~ n`.
    async fn append(&self, envelope: JobEnvelope) -> Result<String, PipelineError>;

    /// Delivers up to `count` entries that have never been delivered to
    /// any consumer, blocking up to `block` if none are immediately
    /// available. Delivered entries move into the pending set under
    /// `consumer`.
    async fn read_new(&self, consumer: &str, count: usize, block: Duration) -> Result<Vec<StreamEntry>, PipelineError>;

    /// Reassigns pending entries idle for at least `min_idle` to
    /// `consumer`, as if the original consumer crashed before acking.
    async fn claim_idle(&self, consumer: &str, min_idle: Duration, count: usize) -> Result<Vec<StreamEntry>, PipelineError>;

    /// Acknowledges and deletes entries, removing them from both the
    /// stream and the pending set. Idempotent: acking an already-deleted
    /// id is a no-op.
    async fn ack_delete(&self, ids: &[String]) -> Result<(), PipelineError>;
}

struct Pending {
    consumer: String,
    claimed_at: Instant,
}

struct State {
    entries: VecDeque<(String, JobEnvelope)>,
    pending: std::collections::HashMap<String, Pending>,
    next_id: u64,
}

/// In-process stand-in for a durable stream. Good enough to drive every
/// testable property in spec.md §8 around retries, reclaim, and ordering
/// without a running message broker.
pub struct MemoryStream {
    state: Mutex<State>,
    max_len: usize,
}

impl MemoryStream {
    pub fn new(max_len: usize) -> Self {
        Self {
            state: Mutex::new(State {
                entries: VecDeque::new(),
                pending: std::collections::HashMap::new(),
                next_id: 1,
            }),
            max_len,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("job stream mutex poisoned")
    }
}

#[async_trait]
impl Stream for MemoryStream {
    async fn append(&self, envelope: JobEnvelope) -> Result<String, PipelineError> {
        let mut state = self.lock();
        let id = state.next_id.to_string();
        state.next_id += 1;
        state.entries.push_back((id.clone(), envelope));

        while state.entries.len() > self.max_len {
            if let Some((evicted_id, _)) = state.entries.pop_front() {
                state.pending.remove(&evicted_id);
            }
        }
        Ok(id)
    }

    async fn read_new(&self, consumer: &str, count: usize, block: Duration) -> Result<Vec<StreamEntry>, PipelineError> {
        let collect = |state: &mut State| -> Vec<StreamEntry> {
            let mut out = Vec::new();
            for (id, envelope) in state.entries.iter() {
                if out.len() >= count {
                    break;
                }
                if state.pending.contains_key(id) {
                    continue;
                }
                out.push(StreamEntry { id: id.clone(), envelope: envelope.clone() });
            }
            for entry in &out {
                state.pending.insert(
                    entry.id.clone(),
                    Pending { consumer: consumer.to_string(), claimed_at: Instant::now() },
                );
            }
            out
        };

        let first = collect(&mut self.lock());
        if !first.is_empty() || block.is_zero() {
            return Ok(first);
        }

        tokio::time::sleep(block).await;
        Ok(collect(&mut self.lock()))
    }

    async fn claim_idle(&self, consumer: &str, min_idle: Duration, count: usize) -> Result<Vec<StreamEntry>, PipelineError> {
        let mut state = self.lock();
        let stale_ids: Vec<String> = state
            .pending
            .iter()
            .filter(|(_, p)| p.claimed_at.elapsed() >= min_idle)
            .take(count)
            .map(|(id, _)| id.clone())
            .collect();

        let mut out = Vec::new();
        for id in stale_ids {
            if let Some((_, envelope)) = state.entries.iter().find(|(eid, _)| eid == &id) {
                out.push(StreamEntry { id: id.clone(), envelope: envelope.clone() });
            }
            state.pending.insert(id, Pending { consumer: consumer.to_string(), claimed_at: Instant::now() });
        }
        Ok(out)
    }

    async fn ack_delete(&self, ids: &[String]) -> Result<(), PipelineError> {
        let mut state = self.lock();
        state.entries.retain(|(id, _)| !ids.contains(id));
        for id in ids {
            state.pending.remove(id);
        }
        Ok(())
    }
}
