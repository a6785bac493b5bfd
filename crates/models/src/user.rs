use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::Id;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Active,
    Disabled,
}

/// A registered account.
///
/// `email` is stored lowercased and unique; the first account ever created
/// is promoted to `Role::Admin` — see `models::user::PromoteFirstUser` for
/// the transactional contract a `Store` implementation must honor (spec.md
/// §9 Open Question).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: Role,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Normalizes an email the same way on every insertion path: lowercased,
    /// surrounding whitespace trimmed. Call sites must use this rather than
    /// repeating the normalization, so uniqueness checks never disagree
    /// with what's actually stored.
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, Status::Active)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

/// Marker a `Store::create_user` implementation consults to decide whether
/// the user being inserted should be promoted to admin. The decision must be
/// made as part of the same transaction/mutation as the insert — counting
/// existing users first and inserting second is a check-then-act race under
/// concurrent signups (spec.md §9).
pub trait PromoteFirstUser {
    /// Returns true if, at the time of the call, no user exists yet.
    fn is_first_user(&self) -> bool;
}
