#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum RefreshError {
    /// The presented token does not correspond to any live family, or the
    /// family it names has already expired.
    #[error("invalid refresh token")]
    InvalidRefreshToken,

    /// The presented token was a member of a family but is not the
    /// family's current token — it was already rotated away. Per spec.md
    /// §4.B this revokes the whole family; the caller receives this
    /// variant to signal that the entire session tree is now dead.
    #[error("refresh token replay detected")]
    RefreshTokenReplay,
}
