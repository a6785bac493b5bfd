use chrono::Duration;
use jsonwebtoken::{encode, Algorithm, Header};

use crate::claims::Claims;
use crate::error::TokenError;
use crate::keys::Signer;

/// Mints short-lived service-to-service tokens (spec.md §4.A: "internal
/// callers authenticate with a distinct issuer/audience pair per caller,
/// on a short TTL, signed by the same key material as user tokens").
///
/// Unlike `TokenPlane`, this does not own verification — the receiving
/// service verifies with its own `TokenPlane`, configured with the caller
/// pair's issuer/audience in its allowlist.
pub struct ServiceTokenIssuer<'a> {
    signer: &'a Signer,
    ttl: Duration,
}

impl<'a> ServiceTokenIssuer<'a> {
    pub fn new(signer: &'a Signer, ttl: Duration) -> Self {
        Self { signer, ttl }
    }

    /// `caller` and `callee` become `iss`/`aud` respectively, so every
    /// service-to-service edge gets its own claim pair rather than a
    /// single ambient "service" identity.
    pub fn issue(&self, caller: &str, callee: &str) -> Result<String, TokenError> {
        if caller.is_empty() || callee.is_empty() {
            return Err(TokenError::MissingSub);
        }
        let claims = Claims::new(caller, caller, callee, self.ttl);
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.signer.kid().to_string());
        encode(&header, &claims, self.signer.encoding_key()).map_err(TokenError::Signing)
    }
}
