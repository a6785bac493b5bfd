use base64::Engine;
use jsonwebtoken::{DecodingKey, EncodingKey};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::error::TokenError;

const RSA_KEY_BITS: usize = 2048;

/// The RSA public components published in a JWKS entry (spec.md §6):
/// base64url modulus and exponent, keyed by `kid`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    pub kid: String,
    pub n: String,
    pub e: String,
}

impl PublicKey {
    fn from_rsa(kid: impl Into<String>, public: &RsaPublicKey) -> Self {
        Self {
            kid: kid.into(),
            n: base64_url(&public.n().to_bytes_be()),
            e: base64_url(&public.e().to_bytes_be()),
        }
    }

    pub fn decoding_key(&self) -> Result<DecodingKey, TokenError> {
        DecodingKey::from_rsa_components(&self.n, &self.e).map_err(TokenError::Malformed)
    }
}

fn base64_url(bytes: &[u8]) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// The active signer: a private key plus the `kid` that selects it.
pub struct Signer {
    kid: String,
    encoding_key: EncodingKey,
    public: PublicKey,
}

impl Signer {
    /// Generates a fresh RSA signing key under a random `kid`. Real
    /// deployments mint these out-of-band (e.g. via a KMS) and load the PEM
    /// in; generation lives here so the whole rotation lifecycle is
    /// exercisable without external key material.
    pub fn generate() -> Result<Self, TokenError> {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, RSA_KEY_BITS).map_err(TokenError::KeyGeneration)?;
        Self::from_rsa_private_key(uuid::Uuid::new_v4().to_string(), private)
    }

    pub fn from_rsa_private_key(kid: impl Into<String>, private: RsaPrivateKey) -> Result<Self, TokenError> {
        let kid = kid.into();
        let public = RsaPublicKey::from(&private);
        let pem = private
            .to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)
            .map_err(TokenError::KeyEncoding)?;
        let encoding_key = EncodingKey::from_rsa_pem(pem.as_bytes()).map_err(TokenError::Signing)?;

        Ok(Self {
            public: PublicKey::from_rsa(&kid, &public),
            kid,
            encoding_key,
        })
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }
}

/// Every verifier key the token plane currently honors: the active
/// signer's own public key plus zero-or-more previous signers' public
/// keys, all addressable by `kid` (spec.md §4.A: "zero-downtime
/// rotation"). Tokens signed moments before a rotation keep verifying
/// because the outgoing active key is *demoted*, not discarded.
#[derive(Clone, Default)]
pub struct KeySet {
    keys: Vec<PublicKey>,
}

impl KeySet {
    pub fn new() -> Self {
        Self { keys: Vec::new() }
    }

    /// Registers (or replaces) a verifier key. Called with the active
    /// signer's public key at startup, and again with the outgoing
    /// signer's public key at rotation time.
    pub fn add(&mut self, key: PublicKey) {
        self.keys.retain(|k| k.kid != key.kid);
        self.keys.push(key);
    }

    pub fn find(&self, kid: &str) -> Option<&PublicKey> {
        self.keys.iter().find(|k| k.kid == kid)
    }

    pub fn keys(&self) -> &[PublicKey] {
        &self.keys
    }
}
