#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("key generation failed")]
    KeyGeneration(#[source] rsa::Error),

    #[error("key encoding failed")]
    KeyEncoding(#[source] rsa::pkcs1::Error),

    #[error("signing failed")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("malformed token")]
    Malformed(#[source] jsonwebtoken::errors::Error),

    #[error("unknown signing key id: {0}")]
    UnknownKid(String),

    #[error("unsupported signature algorithm")]
    UnsupportedAlgorithm,

    #[error("issuer {0:?} is not in the allowlist")]
    UntrustedIssuer(String),

    #[error("audience mismatch")]
    AudienceMismatch,

    #[error("token is expired")]
    Expired,

    #[error("token is not yet valid")]
    NotYetValid,

    #[error("issued-at is too far in the future")]
    IssuedInFuture,

    #[error("jti claim is required")]
    MissingJti,

    #[error("sub claim is required")]
    MissingSub,

    #[error("token has been revoked")]
    Revoked,

    #[error("account sessions issued before {0} have been revoked")]
    RevokedBeforeCutoff(chrono::DateTime<chrono::Utc>),

    #[error(transparent)]
    Revocation(#[from] revocation::RevocationError),

    #[error("remote key set fetch failed")]
    RemoteFetch(#[source] anyhow::Error),
}
