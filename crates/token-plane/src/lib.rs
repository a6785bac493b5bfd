pub mod access;
pub mod claims;
pub mod error;
pub mod jwks;
pub mod keys;
pub mod remote;
pub mod service;

pub use access::{TokenPlane, TokenPlaneConfig};
pub use claims::Claims;
pub use error::TokenError;
pub use jwks::{JwksDocument, JwksKey};
pub use keys::{KeySet, PublicKey, Signer};
pub use remote::RemoteJwksClient;
pub use service::ServiceTokenIssuer;
