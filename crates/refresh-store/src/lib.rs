//! Refresh Family Store (spec.md §4.B).
//!
//! A refresh token is an opaque random value belonging to a *family*
//! representing one login session. Rotation generates a new current token
//! within the same family; presenting any non-current member of a family is
//! treated as replay and revokes the whole family (spec.md §8's testable
//! property).
//!
//! The in-memory implementation guards its four maps with a single mutex,
//! per spec.md §5. A networked implementation is expected to key each
//! family by `family_id`, watch that key under an optimistic transaction,
//! and retry on conflict (spec.md §4.B) — the trait below is the seam that
//! contract plugs into, mirroring how `estuary-flow`'s
//! `control::services::builds_root::BuildsRootService` trait is backed by
//! either a local-disk or GCS implementation behind one capability surface.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Duration;
use models::Id;

mod error;
mod family;
mod token;

pub use error::RefreshError;
pub use family::RefreshFamily;
pub use token::{generate_opaque_token, hash_token};

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Creates a new family for `user_id` and returns its opaque raw token.
    async fn create(&self, user_id: Id, ttl: Duration) -> Result<String, RefreshError>;

    /// Rotates the family that `token` belongs to, per the state machine in
    /// spec.md §4.B:
    ///
    /// - Unknown or expired family → `InvalidRefreshToken`.
    /// - `token` is a previously-rotated member → the whole family is
    ///   revoked and `RefreshTokenReplay` is returned.
    /// - Otherwise a new token is generated, set current, and the family's
    ///   expiry is extended by `ttl`.
    async fn rotate(&self, token: &str, ttl: Duration) -> Result<(Id, String), RefreshError>;

    /// Revokes the family containing `token`. Idempotent: presenting an
    /// already-revoked or unknown token is not an error.
    async fn delete(&self, token: &str) -> Result<(), RefreshError>;

    /// Revokes every family belonging to `user_id` (e.g. on password
    /// change or account disable).
    async fn revoke_user(&self, user_id: Id) -> Result<(), RefreshError>;
}

#[derive(Default)]
struct State {
    families: HashMap<Id, RefreshFamily>,
    hash_to_family: HashMap<String, Id>,
    user_index: HashMap<Id, HashSet<Id>>,
}

/// In-process reference implementation of [`RefreshTokenStore`].
pub struct InMemoryRefreshStore {
    state: Mutex<State>,
}

impl InMemoryRefreshStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("refresh store lock poisoned")
    }

    /// Removes every bookkeeping entry for a family (its hash-index
    /// entries and its slot in the user index) without touching `families`
    /// itself, which callers overwrite or leave in place as needed.
    fn unindex(state: &mut State, family: &RefreshFamily) {
        for hash in &family.member_hashes {
            state.hash_to_family.remove(hash);
        }
        if let Some(set) = state.user_index.get_mut(&family.user_id) {
            set.remove(&family.family_id);
        }
    }
}

impl Default for InMemoryRefreshStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshStore {
    async fn create(&self, user_id: Id, ttl: Duration) -> Result<String, RefreshError> {
        let raw_token = generate_opaque_token();
        let token_hash = hash_token(&raw_token);
        let family = RefreshFamily::new(user_id, token_hash.clone(), chrono::Utc::now() + ttl);

        let mut state = self.lock();
        state.hash_to_family.insert(token_hash, family.family_id);
        state
            .user_index
            .entry(user_id)
            .or_default()
            .insert(family.family_id);
        state.families.insert(family.family_id, family);

        Ok(raw_token)
    }

    async fn rotate(&self, token: &str, ttl: Duration) -> Result<(Id, String), RefreshError> {
        let token_hash = hash_token(token);
        let mut state = self.lock();

        let family_id = *state
            .hash_to_family
            .get(&token_hash)
            .ok_or(RefreshError::InvalidRefreshToken)?;

        let family = state
            .families
            .get(&family_id)
            .ok_or(RefreshError::InvalidRefreshToken)?;

        if !family.is_live() {
            return Err(RefreshError::InvalidRefreshToken);
        }

        if family.is_replayed_member(&token_hash) {
            let family = state.families.get_mut(&family_id).unwrap();
            family.revoked = true;
            let family = family.clone();
            Self::unindex(&mut state, &family);
            tracing::warn!(user_id = %family.user_id, family_id = %family.family_id, "refresh token replay detected, revoking family");
            return Err(RefreshError::RefreshTokenReplay);
        }

        // `token_hash` must equal `current_token_hash` at this point: it
        // resolved through the hash index, isn't a stale replayed member,
        // and the family is live.
        let user_id = family.user_id;
        let new_raw_token = generate_opaque_token();
        let new_hash = hash_token(&new_raw_token);

        let family = state.families.get_mut(&family_id).unwrap();
        family.rotate(new_hash.clone(), ttl);
        state.hash_to_family.insert(new_hash, family_id);

        Ok((user_id, new_raw_token))
    }

    async fn delete(&self, token: &str) -> Result<(), RefreshError> {
        let token_hash = hash_token(token);
        let mut state = self.lock();

        let Some(&family_id) = state.hash_to_family.get(&token_hash) else {
            return Ok(());
        };

        if let Some(family) = state.families.get_mut(&family_id) {
            family.revoked = true;
            let family = family.clone();
            Self::unindex(&mut state, &family);
        }
        Ok(())
    }

    async fn revoke_user(&self, user_id: Id) -> Result<(), RefreshError> {
        let mut state = self.lock();
        let Some(family_ids) = state.user_index.remove(&user_id) else {
            return Ok(());
        };

        let count = family_ids.len();
        for family_id in family_ids {
            if let Some(family) = state.families.get_mut(&family_id) {
                family.revoked = true;
                let family = family.clone();
                Self::unindex(&mut state, &family);
            }
        }
        tracing::info!(%user_id, families_revoked = count, "revoked all refresh families for user");
        Ok(())
    }
}
