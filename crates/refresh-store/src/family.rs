use std::collections::HashSet;

use chrono::{DateTime, Utc};
use models::Id;

/// The set of all refresh tokens descended from one login (GLOSSARY:
/// Family). `member_hashes` retains every hash ever issued in the family
/// purely so a reused (non-current) member can be recognized as replay
/// rather than as simply unknown.
#[derive(Clone, Debug)]
pub struct RefreshFamily {
    pub family_id: Id,
    pub user_id: Id,
    pub current_token_hash: String,
    pub expiry: DateTime<Utc>,
    pub member_hashes: HashSet<String>,
    pub revoked: bool,
}

impl RefreshFamily {
    pub fn new(user_id: Id, token_hash: String, expiry: DateTime<Utc>) -> Self {
        let mut member_hashes = HashSet::new();
        member_hashes.insert(token_hash.clone());
        Self {
            family_id: Id::new(),
            user_id,
            current_token_hash: token_hash,
            expiry,
            member_hashes,
            revoked: false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expiry <= Utc::now()
    }

    pub fn is_live(&self) -> bool {
        !self.revoked && !self.is_expired()
    }

    /// True if `token_hash` was issued at some point in this family's
    /// history but is not the current token — i.e. a rotated-away value
    /// presented again.
    pub fn is_replayed_member(&self, token_hash: &str) -> bool {
        token_hash != self.current_token_hash && self.member_hashes.contains(token_hash)
    }

    pub fn rotate(&mut self, new_hash: String, ttl: chrono::Duration) {
        self.current_token_hash = new_hash.clone();
        self.member_hashes.insert(new_hash);
        self.expiry = Utc::now() + ttl;
    }
}
