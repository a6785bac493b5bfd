use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The registered claim set spec.md §4.A names: `iss`, `sub`, `aud`, `iat`,
/// `nbf`, `exp`, `jti`. All five time fields are Unix seconds on the wire,
/// per the `jsonwebtoken`/JWT convention.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub iat: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub nbf: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub exp: DateTime<Utc>,
    pub jti: String,
}

impl Claims {
    pub fn new(iss: impl Into<String>, sub: impl Into<String>, aud: impl Into<String>, ttl: chrono::Duration) -> Self {
        let now = Utc::now();
        Self {
            iss: iss.into(),
            sub: sub.into(),
            aud: aud.into(),
            iat: now,
            nbf: now,
            exp: now + ttl,
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }
}
