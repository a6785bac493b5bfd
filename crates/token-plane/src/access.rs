use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, decode_header, encode, Algorithm, Header, Validation};
use revocation::RevocationStore;

use crate::claims::Claims;
use crate::error::TokenError;
use crate::keys::{KeySet, Signer};

/// Access token issuance and verification per spec.md §4.A.
///
/// One `TokenPlane` is the issuer for exactly one `iss` value, but verifies
/// tokens from every issuer in `allowed_issuers` against the key material
/// in its `KeySet` — this is what lets the token plane sit in front of
/// several cooperating issuers (e.g. the gateway accepting its own tokens
/// plus ones minted during a migration window) without trusting arbitrary
/// signers.
pub struct TokenPlane {
    signer: Signer,
    verifiers: KeySet,
    issuer: String,
    allowed_issuers: HashSet<String>,
    audience: String,
    leeway: Duration,
    access_ttl: Duration,
    revocation: Arc<dyn RevocationStore>,
}

pub struct TokenPlaneConfig {
    pub issuer: String,
    pub allowed_issuers: HashSet<String>,
    pub audience: String,
    pub leeway: Duration,
    pub access_ttl: Duration,
}

impl TokenPlaneConfig {
    pub fn single_issuer(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        let issuer = issuer.into();
        let mut allowed_issuers = HashSet::new();
        allowed_issuers.insert(issuer.clone());
        Self {
            issuer,
            allowed_issuers,
            audience: audience.into(),
            leeway: Duration::seconds(30),
            access_ttl: Duration::minutes(15),
        }
    }
}

impl TokenPlane {
    pub fn new(signer: Signer, config: TokenPlaneConfig, revocation: Arc<dyn RevocationStore>) -> Self {
        let mut verifiers = KeySet::new();
        verifiers.add(signer.public_key().clone());

        Self {
            signer,
            verifiers,
            issuer: config.issuer,
            allowed_issuers: config.allowed_issuers,
            audience: config.audience,
            leeway: config.leeway,
            access_ttl: config.access_ttl,
            revocation,
        }
    }

    pub fn jwks(&self) -> &KeySet {
        &self.verifiers
    }

    /// Rotates the active signer. The outgoing signer's public key is kept
    /// in the verifier set so tokens it already minted keep validating
    /// until they naturally expire (spec.md §4.A: "zero-downtime
    /// rotation").
    pub fn rotate_signer(&mut self, new_signer: Signer) {
        self.verifiers.add(new_signer.public_key().clone());
        self.signer = new_signer;
    }

    pub fn issue_access_token(&self, subject: &str) -> Result<String, TokenError> {
        if subject.is_empty() {
            return Err(TokenError::MissingSub);
        }
        let claims = Claims::new(&self.issuer, subject, &self.audience, self.access_ttl);
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.signer.kid().to_string());
        encode(&header, &claims, self.signer.encoding_key()).map_err(TokenError::Signing)
    }

    /// Verifies a token against the full contract in spec.md §4.A:
    /// algorithm allowlist, `kid` resolution, issuer allowlist, exact
    /// audience match, `exp`/`nbf`/`iat` with leeway, non-empty `jti`/`sub`,
    /// and the revocation registry (both the JTI blacklist and the
    /// subject's revoked-after cutoff).
    pub async fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        match self.verify_inner(token).await {
            Ok(claims) => Ok(claims),
            Err(e) => {
                tracing::warn!(error = %e, "access token verification failed");
                Err(e)
            }
        }
    }

    async fn verify_inner(&self, token: &str) -> Result<Claims, TokenError> {
        let header = decode_header(token).map_err(TokenError::Malformed)?;
        if header.alg != Algorithm::RS256 {
            return Err(TokenError::UnsupportedAlgorithm);
        }
        let kid = header.kid.ok_or(TokenError::UnknownKid(String::new()))?;
        let verifier = self
            .verifiers
            .find(&kid)
            .ok_or_else(|| TokenError::UnknownKid(kid.clone()))?;
        let decoding_key = verifier.decoding_key()?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_audience(&[self.audience.clone()]);
        validation.set_issuer(&self.allowed_issuers.iter().cloned().collect::<Vec<_>>());
        validation.leeway = self.leeway.num_seconds().max(0) as u64;

        let data = decode::<Claims>(token, &decoding_key, &validation).map_err(TokenError::Malformed)?;
        let claims = data.claims;

        if claims.jti.is_empty() {
            return Err(TokenError::MissingJti);
        }
        if claims.sub.is_empty() {
            return Err(TokenError::MissingSub);
        }
        if !self.allowed_issuers.contains(&claims.iss) {
            return Err(TokenError::UntrustedIssuer(claims.iss));
        }
        if claims.aud != self.audience {
            return Err(TokenError::AudienceMismatch);
        }

        let leeway_future_bound = Utc::now() + self.leeway;
        if claims.iat > leeway_future_bound {
            return Err(TokenError::IssuedInFuture);
        }

        if self.revocation.is_revoked(&claims.jti).await? {
            return Err(TokenError::Revoked);
        }
        if let Some(cutoff) = self.revocation.revoked_after(&claims.sub).await? {
            if cutoff >= claims.iat {
                return Err(TokenError::RevokedBeforeCutoff(cutoff));
            }
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revocation::InMemoryRevocationRegistry;

    fn plane() -> TokenPlane {
        let signer = Signer::generate().unwrap();
        let config = TokenPlaneConfig::single_issuer("onebook-gateway", "onebook-clients");
        TokenPlane::new(signer, config, Arc::new(InMemoryRevocationRegistry::new()))
    }

    #[tokio::test]
    async fn issues_and_verifies_a_token() {
        let plane = plane();
        let token = plane.issue_access_token("user-1").unwrap();
        let claims = plane.verify(&token).await.unwrap();
        assert_eq!(claims.sub, "user-1");
        assert!(!claims.jti.is_empty());
    }

    #[tokio::test]
    async fn rejects_token_with_wrong_audience() {
        let signer = Signer::generate().unwrap();
        let issuer_config = TokenPlaneConfig::single_issuer("onebook-gateway", "wrong-audience");
        let issuer_plane = TokenPlane::new(signer, issuer_config, Arc::new(InMemoryRevocationRegistry::new()));
        let token = issuer_plane.issue_access_token("user-1").unwrap();

        let verifier_signer = Signer::generate().unwrap();
        let mut verifier_plane = TokenPlane::new(
            verifier_signer,
            TokenPlaneConfig::single_issuer("onebook-gateway", "onebook-clients"),
            Arc::new(InMemoryRevocationRegistry::new()),
        );
        // Share key material so signature validation can even get as far as claim checks.
        verifier_plane.verifiers.add(issuer_plane.signer.public_key().clone());

        let err = verifier_plane.verify(&token).await.unwrap_err();
        assert!(matches!(err, TokenError::Malformed(_)));
    }

    #[tokio::test]
    async fn revoked_jti_fails_verification() {
        let plane = plane();
        let token = plane.issue_access_token("user-1").unwrap();
        let claims_before = plane.verify(&token).await.unwrap();

        plane.revocation.revoke(&claims_before.jti, Duration::minutes(5)).await.unwrap();

        let err = plane.verify(&token).await.unwrap_err();
        assert!(matches!(err, TokenError::Revoked));
    }

    #[tokio::test]
    async fn revoke_user_after_iat_fails_verification() {
        let plane = plane();
        let token = plane.issue_access_token("user-1").unwrap();

        plane.revocation.revoke_user("user-1", Utc::now() + Duration::seconds(5)).await.unwrap();

        let err = plane.verify(&token).await.unwrap_err();
        assert!(matches!(err, TokenError::RevokedBeforeCutoff(_)));
    }

    #[tokio::test]
    async fn rotated_out_signer_still_verifies_until_expiry() {
        let mut plane = plane();
        let token = plane.issue_access_token("user-1").unwrap();

        let new_signer = Signer::generate().unwrap();
        plane.rotate_signer(new_signer);

        // The token was signed by the now-previous key; it must still verify.
        let claims = plane.verify(&token).await.unwrap();
        assert_eq!(claims.sub, "user-1");
    }

    #[tokio::test]
    async fn unknown_kid_is_rejected() {
        let plane = plane();
        let other_signer = Signer::generate().unwrap();
        let other_plane = TokenPlane::new(
            other_signer,
            TokenPlaneConfig::single_issuer("onebook-gateway", "onebook-clients"),
            Arc::new(InMemoryRevocationRegistry::new()),
        );
        let token = other_plane.issue_access_token("user-1").unwrap();

        let err = plane.verify(&token).await.unwrap_err();
        assert!(matches!(err, TokenError::UnknownKid(_)));
    }
}
