//! Revocation Registry (spec.md §4.C).
//!
//! Two independent capabilities live here: a per-token JTI blacklist with
//! TTL, and a per-user monotonic-latest "revoked after" cutoff. Both are
//! exposed through one trait so a caller (the token plane's verifier) only
//! needs a single dependency; the in-memory implementation protects both
//! maps with one mutex, the same "one lock for the whole capability" shape
//! as `estuary-flow`'s `control::services::builds_root::FetchBuilds`
//! (a `tokio::sync::Mutex` guarding one piece of shared state per service).

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

mod error;
pub use error::RevocationError;

/// Capability surface the token plane verifies against.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Blacklists `jti` until `ttl` elapses.
    async fn revoke(&self, jti: &str, ttl: chrono::Duration) -> Result<(), RevocationError>;

    /// Whether `jti` is currently blacklisted. Implementations purge
    /// expired entries lazily on this read path.
    async fn is_revoked(&self, jti: &str) -> Result<bool, RevocationError>;

    /// Sets `user_id`'s revoked-after cutoff to `since`, a no-op if an
    /// existing cutoff is already at or after `since` (spec.md §4.C:
    /// "monotonic-latest").
    async fn revoke_user(&self, user_id: &str, since: DateTime<Utc>) -> Result<(), RevocationError>;

    /// The current revoked-after cutoff for `user_id`, if any. Cutoffs
    /// never expire.
    async fn revoked_after(&self, user_id: &str) -> Result<Option<DateTime<Utc>>, RevocationError>;
}

struct JtiEntry {
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    jtis: HashMap<String, JtiEntry>,
    user_cutoffs: HashMap<String, DateTime<Utc>>,
}

/// In-process reference implementation. Sufficient to exercise every
/// testable property spec.md §8 names for the revocation registry; a
/// networked implementation (e.g. a key/value store with native TTLs)
/// would implement `RevocationStore` directly rather than wrap this one.
pub struct InMemoryRevocationRegistry {
    state: Mutex<State>,
}

impl InMemoryRevocationRegistry {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    /// Drops every JTI entry whose TTL has elapsed. `is_revoked` already
    /// purges lazily per-key; this is for a caller that wants to bound
    /// memory growth from JTIs that are never looked up again.
    pub fn sweep(&self) {
        let now = Utc::now();
        let mut state = self.state.lock().expect("revocation registry lock poisoned");
        state.jtis.retain(|_, entry| entry.expires_at > now);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("revocation registry lock poisoned")
    }
}

impl Default for InMemoryRevocationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationRegistry {
    async fn revoke(&self, jti: &str, ttl: chrono::Duration) -> Result<(), RevocationError> {
        if ttl <= chrono::Duration::zero() {
            return Err(RevocationError::NonPositiveTtl);
        }
        let mut state = self.lock();
        state.jtis.insert(
            jti.to_string(),
            JtiEntry {
                expires_at: Utc::now() + ttl,
            },
        );
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, RevocationError> {
        let mut state = self.lock();
        match state.jtis.get(jti) {
            None => Ok(false),
            Some(entry) if entry.expires_at <= Utc::now() => {
                state.jtis.remove(jti);
                Ok(false)
            }
            Some(_) => Ok(true),
        }
    }

    async fn revoke_user(&self, user_id: &str, since: DateTime<Utc>) -> Result<(), RevocationError> {
        let mut state = self.lock();
        let cutoff = state.user_cutoffs.entry(user_id.to_string()).or_insert(since);
        if since > *cutoff {
            *cutoff = since;
        }
        Ok(())
    }

    async fn revoked_after(&self, user_id: &str) -> Result<Option<DateTime<Utc>>, RevocationError> {
        let state = self.lock();
        Ok(state.user_cutoffs.get(user_id).copied())
    }
}
