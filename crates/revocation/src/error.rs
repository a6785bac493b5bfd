#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum RevocationError {
    #[error("revocation ttl must be positive")]
    NonPositiveTtl,
}
